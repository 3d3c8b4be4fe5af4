use serde::{Deserialize, Serialize};

use crate::error::{Result, TextureQaError};
use crate::texture::TextureConfig;

/// Default multiplier applied to grain and feather per step
pub const DEFAULT_DAMPING: f64 = 0.5;
/// Default number of posterize levels added per step
pub const DEFAULT_POSTERIZE_STEP: u32 = 2;

/// Which relaxations a single step performs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxOrder {
    /// Disable halftone and damp every numeric parameter in the same step
    #[default]
    Simultaneous,

    /// Spend a step on disabling halftone alone while it is still on, then
    /// damp the numeric parameters on later steps
    HalftoneFirst,
}

/// Deterministic weakening of a texture that failed QA
///
/// Each step disables the halftone screen (the strongest offender), scales
/// grain strength and feather radius by `damping`, and adds `posterize_step`
/// levels. Grain and feather only ever shrink and posterize levels only ever
/// grow, so repeated application cannot cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialbackPolicy {
    damping: f64,
    posterize_step: u32,
    order: RelaxOrder,
}

impl Default for DialbackPolicy {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            posterize_step: DEFAULT_POSTERIZE_STEP,
            order: RelaxOrder::default(),
        }
    }
}

impl DialbackPolicy {
    /// Build a policy, rejecting parameters that would not strictly weaken
    pub fn new(damping: f64, posterize_step: u32, order: RelaxOrder) -> Result<Self> {
        if !(damping > 0.0 && damping < 1.0) {
            return Err(TextureQaError::invalid_value("dialback.damping", damping));
        }

        if posterize_step == 0 {
            return Err(TextureQaError::invalid_value("dialback.posterize_step", posterize_step));
        }

        Ok(Self {
            damping,
            posterize_step,
            order,
        })
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn posterize_step(&self) -> u32 {
        self.posterize_step
    }

    pub fn order(&self) -> RelaxOrder {
        self.order
    }

    /// One relaxation step; the input is left untouched
    pub fn relax(&self, config: &TextureConfig) -> TextureConfig {
        let mut relaxed = config.clone();
        let halftone_was_on = relaxed.halftone.enabled;
        relaxed.halftone.enabled = false;

        if self.order == RelaxOrder::HalftoneFirst && halftone_was_on {
            return relaxed;
        }

        relaxed.grain_strength *= self.damping;
        relaxed.feather_px *= self.damping;
        relaxed.posterize_levels = relaxed.posterize_levels.saturating_add(self.posterize_step);
        relaxed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{HalftoneSpec, TextureSpec};

    fn strong() -> TextureConfig {
        TextureSpec {
            enable: true,
            grain_strength: 0.8,
            feather_px: 5.0,
            posterize_levels: 2,
            halftone: HalftoneSpec { enable: true, opacity: 0.8, ..Default::default() },
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_single_step_weakens_everything() {
        let config = strong();
        let relaxed = DialbackPolicy::default().relax(&config);

        assert_eq!(relaxed.grain_strength(), 0.4);
        assert_eq!(relaxed.feather_px(), 2.5);
        assert_eq!(relaxed.posterize_levels(), 4);
        assert!(!relaxed.halftone().enabled());
        // Screen geometry is kept so it can be re-enabled by the caller
        assert_eq!(relaxed.halftone().opacity(), 0.8);
        // Input untouched
        assert!(config.halftone().enabled());
        assert_eq!(config.grain_strength(), 0.8);
    }

    #[test]
    fn test_repeated_relaxation_is_monotonic() {
        let policy = DialbackPolicy::default();
        let mut config = strong();
        for _ in 0..50 {
            let next = policy.relax(&config);
            assert!(next.grain_strength() <= config.grain_strength());
            assert!(next.feather_px() <= config.feather_px());
            assert!(next.posterize_levels() >= config.posterize_levels());
            assert!(!next.halftone().enabled());
            if config.grain_strength() > 0.0 {
                assert!(next.grain_strength() < config.grain_strength());
            }
            config = next;
        }
        assert!(config.grain_strength() < 1e-12);
    }

    #[test]
    fn test_zero_parameters_stay_zero() {
        let config = TextureSpec { enable: true, ..Default::default() }.validate().unwrap();
        let relaxed = DialbackPolicy::default().relax(&config);
        assert_eq!(relaxed.grain_strength(), 0.0);
        assert_eq!(relaxed.feather_px(), 0.0);
        assert_eq!(relaxed.posterize_levels(), 3);
    }

    #[test]
    fn test_levels_saturate() {
        let config = TextureSpec { enable: true, posterize_levels: u32::MAX, ..Default::default() }
            .validate()
            .unwrap();
        let relaxed = DialbackPolicy::default().relax(&config);
        assert_eq!(relaxed.posterize_levels(), u32::MAX);
    }

    #[test]
    fn test_halftone_first_spends_a_step_on_the_screen() {
        let policy = DialbackPolicy::new(0.5, 2, RelaxOrder::HalftoneFirst).unwrap();
        let first = policy.relax(&strong());
        assert!(!first.halftone().enabled());
        assert_eq!(first.grain_strength(), 0.8);
        assert_eq!(first.posterize_levels(), 2);

        let second = policy.relax(&first);
        assert_eq!(second.grain_strength(), 0.4);
        assert_eq!(second.posterize_levels(), 4);
    }

    #[test]
    fn test_policy_validation() {
        assert!(DialbackPolicy::new(1.0, 2, RelaxOrder::Simultaneous).is_err());
        assert!(DialbackPolicy::new(0.0, 2, RelaxOrder::Simultaneous).is_err());
        assert!(DialbackPolicy::new(f64::NAN, 2, RelaxOrder::Simultaneous).is_err());
        assert!(DialbackPolicy::new(0.7, 0, RelaxOrder::Simultaneous).is_err());
        assert!(DialbackPolicy::new(0.7, 1, RelaxOrder::HalftoneFirst).is_ok());
    }
}
