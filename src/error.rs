use thiserror::Error;

/// Main error type for the texture-qa library
///
/// Only genuinely exceptional conditions live here. A failed legibility check
/// or an exhausted retry budget is reported through
/// [`QaResult`](crate::qa::QaResult) and [`LoopOutcome`](crate::dialback::LoopOutcome).
#[derive(Error, Debug)]
pub enum TextureQaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Clip processing error: {0}")]
    Clip(#[from] ClipError),

    #[error("Placement data error: {0}")]
    Placement(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Raster construction errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Frame dimensions overflow: {width}x{height}")]
    DimensionsOverflow { width: u32, height: u32 },
}

/// Multi-frame driver errors
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("Failed to build worker pool: {reason}")]
    ThreadPoolFailed { reason: String },

    #[error("Frame {index} has size {actual:?}, clip frames are {expected:?}")]
    InconsistentFrameSize {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Convenience type alias for Results using TextureQaError
pub type Result<T> = std::result::Result<T, TextureQaError>;

impl TextureQaError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Shorthand for an out-of-range or malformed configuration value
    pub fn invalid_value<K: Into<String>, V: ToString>(key: K, value: V) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            value: value.to_string(),
        }
        .into()
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            Self::Clip(ClipError::ThreadPoolFailed { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::InvalidValue { key, value }) => {
                format!(
                    "Configuration value '{}' = {} is out of range. Fix the value and run again.",
                    key, value
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Clip(ClipError::InconsistentFrameSize { index, .. }) => {
                format!(
                    "Frame {} does not match the size of the first frame. All frames in a clip must share one size.",
                    index
                )
            }
            _ => self.to_string(),
        }
    }
}
