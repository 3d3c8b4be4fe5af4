//! # Texture stages
//!
//! Each stage is one self-contained pass over a frame. The transform runs
//! them in a fixed order:
//!
//! - **Grain**: seeded monochrome noise
//! - **Feather**: Gaussian edge softening
//! - **Posterize**: per-channel quantization
//! - **Halftone**: rotated dot screen

mod feather;
mod grain;
mod halftone;
mod posterize;

pub use feather::FeatherStage;
pub use grain::{GrainStage, GRAIN_AMPLITUDE};
pub use halftone::HalftoneStage;
pub use posterize::PosterizeStage;

use crate::{frame::Frame, texture::TextureConfig};

/// Core trait that every texture stage implements
pub trait TextureStage: Send + Sync {
    /// Returns the unique name of this stage
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of this stage
    fn description(&self) -> &'static str;

    /// Whether this stage changes any pixel under `config`
    fn is_active(&self, config: &TextureConfig) -> bool;

    /// Render the stage into a new frame
    ///
    /// Only called when [`is_active`](TextureStage::is_active) returned true.
    /// `seed` is the only permitted source of randomness.
    fn render(&self, frame: &Frame, config: &TextureConfig, seed: u64) -> Frame;

    /// Apply the stage, copying the input unchanged when it is inactive
    fn apply(&self, frame: &Frame, config: &TextureConfig, seed: u64) -> Frame {
        if self.is_active(config) {
            self.render(frame, config, seed)
        } else {
            frame.clone()
        }
    }
}

/// Round and clamp a channel value back into `u8`
pub(crate) fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
