//! # Legibility QA
//!
//! Checks a rendered frame against the text placements of its scene:
//! contrast of each text colour against its background, and placement
//! inside the display safe area.

pub mod color;
pub mod evaluator;
pub mod types;

pub use color::{contrast_ratio, parse_hex_color, relative_luminance};
pub use evaluator::QaEvaluator;
pub use types::{QaResult, QaThresholds, SceneElement, TEXT_ELEMENT};
