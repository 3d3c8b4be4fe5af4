use serde::{Deserialize, Serialize};

use crate::error::{Result, TextureQaError};

/// Default halftone screen spacing when the key is absent
pub const DEFAULT_CELL_PX: u32 = 6;
/// Default halftone screen rotation when the key is absent
pub const DEFAULT_ANGLE_DEG: f64 = 45.0;
/// Default halftone blend when the key is absent
pub const DEFAULT_OPACITY: f64 = 0.5;

/// Texture parameters as they arrive from a config file or a brief
///
/// This is the unvalidated input surface. Missing keys take the defaults
/// below and unknown keys are ignored. Call [`TextureSpec::validate`] to get
/// a [`TextureConfig`] the transform will accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSpec {
    pub enable: bool,
    pub grain_strength: f64,
    pub feather_px: f64,
    pub posterize_levels: u32,
    pub halftone: HalftoneSpec,
}

impl Default for TextureSpec {
    fn default() -> Self {
        Self {
            enable: false,
            grain_strength: 0.0,
            feather_px: 0.0,
            posterize_levels: 1,
            halftone: HalftoneSpec::default(),
        }
    }
}

/// Halftone sub-table of [`TextureSpec`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalftoneSpec {
    pub enable: bool,
    pub cell_px: u32,
    pub angle_deg: f64,
    pub opacity: f64,
}

impl Default for HalftoneSpec {
    fn default() -> Self {
        Self {
            enable: false,
            cell_px: DEFAULT_CELL_PX,
            angle_deg: DEFAULT_ANGLE_DEG,
            opacity: DEFAULT_OPACITY,
        }
    }
}

impl TextureSpec {
    /// Check every value and produce an immutable [`TextureConfig`]
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<TextureConfig> {
        if !(0.0..=1.0).contains(&self.grain_strength) {
            return Err(TextureQaError::invalid_value("grain_strength", self.grain_strength));
        }

        if !self.feather_px.is_finite() || self.feather_px < 0.0 {
            return Err(TextureQaError::invalid_value("feather_px", self.feather_px));
        }

        if self.posterize_levels == 0 {
            return Err(TextureQaError::invalid_value("posterize_levels", self.posterize_levels));
        }

        let halftone = &self.halftone;
        if halftone.cell_px == 0 {
            return Err(TextureQaError::invalid_value("halftone.cell_px", halftone.cell_px));
        }

        if !halftone.angle_deg.is_finite() {
            return Err(TextureQaError::invalid_value("halftone.angle_deg", halftone.angle_deg));
        }

        if !(0.0..=1.0).contains(&halftone.opacity) {
            return Err(TextureQaError::invalid_value("halftone.opacity", halftone.opacity));
        }

        Ok(TextureConfig {
            enabled: self.enable,
            grain_strength: self.grain_strength,
            feather_px: self.feather_px,
            posterize_levels: self.posterize_levels,
            halftone: Halftone {
                enabled: halftone.enable,
                cell_px: halftone.cell_px,
                angle_deg: halftone.angle_deg,
                opacity: halftone.opacity,
            },
        })
    }
}

/// A validated texture configuration
///
/// Values of this type only come out of [`TextureSpec::validate`] or a
/// dial-back step, so every stage can rely on the documented ranges. It
/// serializes with the same keys as [`TextureSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TextureSpec")]
pub struct TextureConfig {
    #[serde(rename = "enable")]
    pub(crate) enabled: bool,
    pub(crate) grain_strength: f64,
    pub(crate) feather_px: f64,
    pub(crate) posterize_levels: u32,
    pub(crate) halftone: Halftone,
}

/// Validated halftone screen parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Halftone {
    #[serde(rename = "enable")]
    pub(crate) enabled: bool,
    pub(crate) cell_px: u32,
    pub(crate) angle_deg: f64,
    pub(crate) opacity: f64,
}

impl TryFrom<TextureSpec> for TextureConfig {
    type Error = TextureQaError;

    fn try_from(spec: TextureSpec) -> Result<Self> {
        spec.validate()
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            grain_strength: 0.0,
            feather_px: 0.0,
            posterize_levels: 1,
            halftone: Halftone {
                enabled: false,
                cell_px: DEFAULT_CELL_PX,
                angle_deg: DEFAULT_ANGLE_DEG,
                opacity: DEFAULT_OPACITY,
            },
        }
    }
}

impl TextureConfig {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Grain amplitude in `[0, 1]`
    pub fn grain_strength(&self) -> f64 {
        self.grain_strength
    }

    /// Feather blur radius in pixels
    pub fn feather_px(&self) -> f64 {
        self.feather_px
    }

    /// Number of quantization steps per channel, at least 1
    pub fn posterize_levels(&self) -> u32 {
        self.posterize_levels
    }

    pub fn halftone(&self) -> &Halftone {
        &self.halftone
    }

    /// Convert back to the input surface, e.g. for persisting the final config
    pub fn to_spec(&self) -> TextureSpec {
        TextureSpec {
            enable: self.enabled,
            grain_strength: self.grain_strength,
            feather_px: self.feather_px,
            posterize_levels: self.posterize_levels,
            halftone: HalftoneSpec {
                enable: self.halftone.enabled,
                cell_px: self.halftone.cell_px,
                angle_deg: self.halftone.angle_deg,
                opacity: self.halftone.opacity,
            },
        }
    }
}

impl Halftone {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Screen cell spacing in pixels, always > 0
    pub fn cell_px(&self) -> u32 {
        self.cell_px
    }

    pub fn angle_deg(&self) -> f64 {
        self.angle_deg
    }

    /// Blend factor of the screen over the frame in `[0, 1]`
    pub fn opacity(&self) -> f64 {
        self.opacity
    }
}
