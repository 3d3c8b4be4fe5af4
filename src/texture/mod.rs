//! # Texture
//!
//! The stylistic transform applied to rendered frames, its parameters, and
//! the signature that identifies a parameter set.
//!
//! ## Usage
//!
//! ```rust
//! use texture_qa::frame::Frame;
//! use texture_qa::texture::{signature, TextureSpec, TextureTransform};
//!
//! let config = TextureSpec { enable: true, grain_strength: 0.2, posterize_levels: 8, ..Default::default() }
//!     .validate()
//!     .unwrap();
//! let frame = Frame::new_filled(64, 36, [30, 60, 90]);
//! let textured = TextureTransform::new().apply(&frame, &config, 42);
//! assert_eq!(textured.dimensions(), frame.dimensions());
//! println!("config {}", signature(&config).short());
//! ```

pub mod config;
pub mod signature;
pub mod stages;
pub mod transform;

pub use config::{Halftone, HalftoneSpec, TextureConfig, TextureSpec};
pub use signature::{signature, signature_with_seed, Signature};
pub use stages::TextureStage;
pub use transform::{apply, TextureTransform};
