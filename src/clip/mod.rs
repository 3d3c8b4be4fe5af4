//! # Clip Processing
//!
//! Multi-frame entry point: the texture (or the full QA loop) applied to
//! every frame of a clip.

pub mod driver;

pub use driver::{ClipDriver, ClipReport, ClipSettings};
