use tracing::trace;

use super::stages::{FeatherStage, GrainStage, HalftoneStage, PosterizeStage, TextureStage};
use super::TextureConfig;
use crate::frame::Frame;

/// The full texture pipeline: grain, feather, posterize, halftone
///
/// The order is fixed. Grain sits under the posterization, feathering has
/// to precede posterize or the quantization bands at edges, and the halftone
/// screen goes on last.
pub struct TextureTransform {
    stages: Vec<Box<dyn TextureStage>>,
}

impl TextureTransform {
    pub fn new() -> Self {
        Self {
            stages: vec![
                Box::new(GrainStage),
                Box::new(FeatherStage),
                Box::new(PosterizeStage),
                Box::new(HalftoneStage),
            ],
        }
    }

    /// Apply every active stage to `frame`
    ///
    /// The input is never modified and the result never aliases it. A
    /// disabled config returns a pixel-identical copy. For fixed
    /// `(frame, config, seed)` the output is byte-identical across calls and
    /// processes.
    pub fn apply(&self, frame: &Frame, config: &TextureConfig, seed: u64) -> Frame {
        if !config.enabled() {
            return frame.clone();
        }

        let mut current: Option<Frame> = None;
        for stage in &self.stages {
            if !stage.is_active(config) {
                continue;
            }
            trace!("Applying {} stage: {}", stage.name(), stage.description());
            let input = current.as_ref().unwrap_or(frame);
            current = Some(stage.render(input, config, seed));
        }

        current.unwrap_or_else(|| frame.clone())
    }

    /// Names of the stages that would change pixels under `config`, in order
    pub fn active_stages(&self, config: &TextureConfig) -> Vec<&'static str> {
        if !config.enabled() {
            return Vec::new();
        }
        self.stages
            .iter()
            .filter(|stage| stage.is_active(config))
            .map(|stage| stage.name())
            .collect()
    }
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the standard pipeline once
pub fn apply(frame: &Frame, config: &TextureConfig, seed: u64) -> Frame {
    TextureTransform::new().apply(frame, config, seed)
}
