use serde::Serialize;
use tracing::{debug, info, warn};

use super::policy::DialbackPolicy;
use crate::{
    error::Result,
    frame::Frame,
    qa::{QaEvaluator, QaResult, SceneElement},
    texture::{signature, Signature, TextureConfig, TextureSpec, TextureTransform},
};

/// States of the dial-back loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Attempt,
    Evaluate,
    Relax,
    Accept,
    Exhausted,
}

/// One pass of transform + evaluate
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    /// Zero-based attempt index
    pub attempt: u32,
    pub config: TextureConfig,
    pub signature: Signature,
    pub result: QaResult,
}

/// What [`QaLoopController::run`] hands back
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// The last attempted frame, textured with the last attempted config
    pub frame: Frame,
    /// Audit trail, one record per attempt in order
    pub attempts: Vec<AttemptRecord>,
    /// False when the retry budget ran out before QA passed
    pub succeeded: bool,
}

impl LoopOutcome {
    pub fn attempts_used(&self) -> usize {
        self.attempts.len()
    }

    /// True when at least one relaxation step ran
    pub fn dialback_applied(&self) -> bool {
        self.attempts.len() > 1
    }

    pub fn final_state(&self) -> LoopState {
        if self.succeeded {
            LoopState::Accept
        } else {
            LoopState::Exhausted
        }
    }

    pub fn final_attempt(&self) -> Option<&AttemptRecord> {
        self.attempts.last()
    }

    /// Config used for the returned frame
    pub fn final_config(&self) -> Option<&TextureConfig> {
        self.final_attempt().map(|record| &record.config)
    }

    /// Serializable summary without pixel data
    pub fn report(&self) -> LoopReport<'_> {
        LoopReport {
            succeeded: self.succeeded,
            dialback_applied: self.dialback_applied(),
            final_state: self.final_state(),
            attempts: &self.attempts,
        }
    }
}

/// Audit view of a [`LoopOutcome`]
#[derive(Debug, Serialize)]
pub struct LoopReport<'a> {
    pub succeeded: bool,
    pub dialback_applied: bool,
    pub final_state: LoopState,
    pub attempts: &'a [AttemptRecord],
}

/// Loop state together with the data that state owns
enum Step {
    Attempt(TextureConfig),
    Evaluate(TextureConfig, Frame),
    Relax(TextureConfig, Frame),
    Done(Frame, bool),
}

/// Transform, evaluate, and dial back until QA passes or the budget runs out
///
/// Every attempt reuses the caller's frame and seed; only the config changes.
/// The loop performs at most `max_retries + 1` transform/evaluate passes.
pub struct QaLoopController {
    transform: TextureTransform,
    evaluator: QaEvaluator,
    policy: DialbackPolicy,
}

impl QaLoopController {
    pub fn new(evaluator: QaEvaluator, policy: DialbackPolicy) -> Self {
        Self {
            transform: TextureTransform::new(),
            evaluator,
            policy,
        }
    }

    /// Replace the texture pipeline
    pub fn with_transform(mut self, transform: TextureTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn evaluator(&self) -> &QaEvaluator {
        &self.evaluator
    }

    pub fn policy(&self) -> &DialbackPolicy {
        &self.policy
    }

    /// Run the loop for one frame
    ///
    /// Running out of retries is not an error: the outcome carries
    /// `succeeded = false` and the last attempted frame, never the untextured
    /// original.
    pub fn run(
        &self,
        frame: &Frame,
        placement: Option<&[SceneElement]>,
        config: &TextureConfig,
        seed: u64,
        max_retries: u32,
    ) -> LoopOutcome {
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut attempt = 0u32;
        let mut step = Step::Attempt(config.clone());

        let (frame, succeeded) = loop {
            step = match step {
                Step::Attempt(config) => {
                    let candidate = self.transform.apply(frame, &config, seed);
                    Step::Evaluate(config, candidate)
                }
                Step::Evaluate(config, candidate) => {
                    let result = self.evaluator.evaluate(&candidate, placement);
                    let ok = result.ok();
                    let signature = signature(&config);
                    debug!(
                        "Attempt {} with config {}: ok={} fails={:?}",
                        attempt,
                        signature.short(),
                        ok,
                        result.fails()
                    );
                    attempts.push(AttemptRecord {
                        attempt,
                        config: config.clone(),
                        signature,
                        result,
                    });

                    if ok {
                        Step::Done(candidate, true)
                    } else if attempt < max_retries {
                        Step::Relax(config, candidate)
                    } else {
                        Step::Done(candidate, false)
                    }
                }
                Step::Relax(config, _rejected) => {
                    attempt += 1;
                    Step::Attempt(self.policy.relax(&config))
                }
                Step::Done(candidate, succeeded) => break (candidate, succeeded),
            };
        };

        if succeeded {
            info!("Texture accepted after {} attempt(s)", attempts.len());
        } else {
            warn!(
                "Texture still failing QA after {} attempt(s); returning last attempt",
                attempts.len()
            );
        }

        LoopOutcome {
            frame,
            attempts,
            succeeded,
        }
    }

    /// Validate a raw spec, then [`run`](Self::run)
    ///
    /// Configuration errors surface here before any pixel is touched.
    pub fn run_spec(
        &self,
        frame: &Frame,
        placement: Option<&[SceneElement]>,
        spec: &TextureSpec,
        seed: u64,
        max_retries: u32,
    ) -> Result<LoopOutcome> {
        let config = spec.validate()?;
        Ok(self.run(frame, placement, &config, seed, max_retries))
    }
}

impl Default for QaLoopController {
    fn default() -> Self {
        Self::new(QaEvaluator::default(), DialbackPolicy::default())
    }
}
