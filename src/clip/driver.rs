use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    dialback::{LoopOutcome, QaLoopController},
    error::{ClipError, Result, TextureQaError},
    frame::Frame,
    qa::SceneElement,
    texture::{TextureConfig, TextureTransform},
};

/// 2^64 / golden ratio; spreads consecutive frame indices across the seed space
const FRAME_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Multi-frame processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSettings {
    /// Number of worker threads
    pub processing_threads: usize,

    /// Reuse the base seed for every frame, freezing the grain pattern
    pub static_grain: bool,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            processing_threads: num_cpus::get(),
            static_grain: false,
        }
    }
}

impl ClipSettings {
    pub fn validate(&self) -> Result<()> {
        if self.processing_threads == 0 {
            return Err(TextureQaError::invalid_value(
                "clip.processing_threads",
                self.processing_threads,
            ));
        }
        Ok(())
    }
}

/// Per-clip result of [`ClipDriver::run_frames`]
#[derive(Debug, Clone)]
pub struct ClipReport {
    pub outcomes: Vec<LoopOutcome>,
}

impl ClipReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.succeeded)
    }

    /// Indices of frames whose loop ran out of retries
    pub fn failed_frames(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.succeeded)
            .map(|(i, _)| i)
            .collect()
    }

    /// Final frames in clip order
    pub fn into_frames(self) -> Vec<Frame> {
        self.outcomes.into_iter().map(|outcome| outcome.frame).collect()
    }
}

/// Applies the texture across a sequence of frames
///
/// Frames are independent, so they are processed in parallel on a dedicated
/// rayon pool. Each frame gets its own seed derived from the clip seed and
/// its index, which keeps the output identical whatever the thread count.
pub struct ClipDriver {
    pool: rayon::ThreadPool,
    settings: ClipSettings,
    transform: TextureTransform,
}

impl ClipDriver {
    pub fn new(settings: ClipSettings) -> Result<Self> {
        settings.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.processing_threads)
            .thread_name(|i| format!("texture-clip-{}", i))
            .build()
            .map_err(|e| ClipError::ThreadPoolFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            pool,
            settings,
            transform: TextureTransform::new(),
        })
    }

    pub fn settings(&self) -> &ClipSettings {
        &self.settings
    }

    /// Seed used for the frame at `index`
    pub fn frame_seed(&self, seed: u64, index: usize) -> u64 {
        if self.settings.static_grain {
            seed
        } else {
            seed.wrapping_add((index as u64).wrapping_mul(FRAME_SEED_STRIDE))
        }
    }

    /// Texture every frame, preserving order
    pub fn texture_frames(
        &self,
        frames: &[Frame],
        config: &TextureConfig,
        seed: u64,
    ) -> Result<Vec<Frame>> {
        check_frame_sizes(frames)?;
        info!(
            "Texturing {} frames on {} threads",
            frames.len(),
            self.settings.processing_threads
        );

        let textured: Vec<Frame> = self.pool.install(|| {
            frames
                .par_iter()
                .enumerate()
                .map(|(i, frame)| self.transform.apply(frame, config, self.frame_seed(seed, i)))
                .collect()
        });
        Ok(textured)
    }

    /// Run an independent QA loop on every frame
    pub fn run_frames(
        &self,
        frames: &[Frame],
        placement: Option<&[SceneElement]>,
        config: &TextureConfig,
        seed: u64,
        max_retries: u32,
        controller: &QaLoopController,
    ) -> Result<ClipReport> {
        check_frame_sizes(frames)?;
        info!(
            "Running QA loop on {} frames (max {} retries each)",
            frames.len(),
            max_retries
        );

        let outcomes: Vec<LoopOutcome> = self.pool.install(|| {
            frames
                .par_iter()
                .enumerate()
                .map(|(i, frame)| {
                    let outcome = controller.run(
                        frame,
                        placement,
                        config,
                        self.frame_seed(seed, i),
                        max_retries,
                    );
                    debug!(
                        "Frame {}: succeeded={} after {} attempt(s)",
                        i,
                        outcome.succeeded,
                        outcome.attempts_used()
                    );
                    outcome
                })
                .collect()
        });

        let report = ClipReport { outcomes };
        if !report.all_succeeded() {
            info!("{} of {} frames exhausted their retries", report.failed_frames().len(), report.len());
        }
        Ok(report)
    }
}

fn check_frame_sizes(frames: &[Frame]) -> Result<()> {
    let Some(first) = frames.first() else {
        return Ok(());
    };
    let expected = first.dimensions();
    for (index, frame) in frames.iter().enumerate().skip(1) {
        if frame.dimensions() != expected {
            return Err(ClipError::InconsistentFrameSize {
                index,
                expected,
                actual: frame.dimensions(),
            }
            .into());
        }
    }
    Ok(())
}
