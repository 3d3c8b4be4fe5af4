use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    clip::ClipSettings,
    dialback::{DialbackPolicy, QaLoopController, RelaxOrder},
    error::{ConfigError, Result, TextureQaError},
    qa::{QaEvaluator, QaThresholds},
    texture::{TextureConfig, TextureSpec},
};

/// Main configuration for texture-qa
///
/// Every key is optional; a missing key takes its documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grain seed for single frames, base seed for clips
    pub seed: u64,

    /// Texture parameters
    pub texture: TextureSpec,

    /// Legibility thresholds
    pub qa: QaThresholds,

    /// Dial-back loop settings
    pub dialback: DialbackConfig,

    /// Multi-frame settings
    pub clip: ClipSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            texture: TextureSpec::default(),
            qa: QaThresholds::default(),
            dialback: DialbackConfig::default(),
            clip: ClipSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config = Self::from_toml_str(&content).map_err(|e| match e {
            TextureQaError::Config(ConfigError::ParseFailed { reason, .. }) => {
                ConfigError::ParseFailed {
                    path: path.display().to_string(),
                    reason,
                }
                .into()
            }
            other => other,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ConfigError::ParseFailed {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.texture.validate()?;
        self.qa.validate()?;
        self.dialback.validate()?;
        self.clip.validate()?;
        Ok(())
    }

    /// The validated texture config
    pub fn texture_config(&self) -> Result<TextureConfig> {
        self.texture.validate()
    }

    /// A loop controller wired with this configuration's thresholds and policy
    pub fn controller(&self) -> Result<QaLoopController> {
        self.qa.validate()?;
        Ok(QaLoopController::new(
            QaEvaluator::new(self.qa),
            self.dialback.policy()?,
        ))
    }
}

/// Dial-back loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialbackConfig {
    /// Relaxation steps allowed after the first attempt
    pub max_retries: u32,

    /// Multiplier for grain strength and feather radius per step, in (0, 1)
    pub damping: f64,

    /// Posterize levels added per step
    pub posterize_step: u32,

    /// Which relaxations one step performs
    pub order: RelaxOrder,
}

impl Default for DialbackConfig {
    fn default() -> Self {
        let policy = DialbackPolicy::default();
        Self {
            max_retries: 3,
            damping: policy.damping(),
            posterize_step: policy.posterize_step(),
            order: policy.order(),
        }
    }
}

impl DialbackConfig {
    fn validate(&self) -> Result<()> {
        self.policy().map(|_| ())
    }

    /// The validated relaxation policy
    pub fn policy(&self) -> Result<DialbackPolicy> {
        DialbackPolicy::new(self.damping, self.posterize_step, self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.seed = 1234;
        original_config.texture.enable = true;
        original_config.texture.grain_strength = 0.12;
        original_config.dialback.order = RelaxOrder::HalftoneFirst;

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let config = Config::from_toml_str(
            r#"
            seed = 7

            [texture]
            enable = true
            grain_strength = 0.8
            feather_px = 5.0
            posterize_levels = 2

            [texture.halftone]
            enable = true
            opacity = 0.8

            [dialback]
            max_retries = 2
            order = "halftone_first"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.dialback.max_retries, 2);
        assert_eq!(config.dialback.damping, 0.5);
        assert_eq!(config.dialback.order, RelaxOrder::HalftoneFirst);
        assert_eq!(config.qa, QaThresholds::default());
        assert!(config.texture_config().unwrap().halftone().enabled());
        assert!(config.controller().is_ok());
    }

    #[test]
    fn test_invalid_texture_value() {
        let mut config = Config::default();
        config.texture.grain_strength = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_damping() {
        let mut config = Config::default();
        config.dialback.damping = 1.0;
        assert!(config.validate().is_err());
        assert!(config.controller().is_err());
    }

    #[test]
    fn test_invalid_thread_count() {
        let mut config = Config::default();
        config.clip.processing_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, TextureQaError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("broken.toml");
        std::fs::write(&file_path, "[texture\ngrain_strength = ").unwrap();
        let err = Config::from_file(&file_path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
