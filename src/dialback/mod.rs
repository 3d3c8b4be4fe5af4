//! # Dial-back
//!
//! When a textured frame fails legibility QA the texture is weakened one
//! deterministic step at a time and the frame is re-rendered, until QA
//! passes or the retry budget is spent.
//!
//! ```text
//! ATTEMPT -> EVALUATE -> ACCEPT
//!               |
//!               +-> RELAX -> ATTEMPT      (attempt < max_retries)
//!               +-> EXHAUSTED             (attempt == max_retries)
//! ```

pub mod controller;
pub mod policy;

pub use controller::{AttemptRecord, LoopOutcome, LoopReport, LoopState, QaLoopController};
pub use policy::{DialbackPolicy, RelaxOrder};
