//! # Texture-QA
//!
//! Stylistic texture for rendered frames, kept legible by a QA loop.
//!
//! A texture (film grain, edge feathering, posterization and an optional
//! halftone screen) is applied to a frame, the result is checked for text
//! contrast and safe-area placement, and when the check fails the texture is
//! dialed back step by step until it passes or the retry budget runs out.
//!
//! ## Quick Start
//!
//! ```rust
//! use texture_qa::{
//!     dialback::QaLoopController,
//!     frame::Frame,
//!     qa::SceneElement,
//!     texture::TextureSpec,
//! };
//!
//! let frame = Frame::new_filled(320, 180, [10, 10, 30]);
//! let scene = vec![SceneElement::text("title", "#ffffff", [0.1, 0.1, 0.5, 0.2])];
//! let config = TextureSpec { enable: true, grain_strength: 0.3, posterize_levels: 256, ..Default::default() }
//!     .validate()
//!     .unwrap();
//!
//! let controller = QaLoopController::default();
//! let outcome = controller.run(&frame, Some(&scene), &config, 42, 3);
//! assert!(outcome.succeeded);
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`texture`] - Texture parameters, signature and the stage pipeline
//! - [`qa`] - Legibility evaluation
//! - [`dialback`] - Relaxation policy and the QA loop controller
//! - [`clip`] - Parallel multi-frame processing
//! - [`config`] - Configuration management

pub mod clip;
pub mod config;
pub mod dialback;
pub mod error;
pub mod frame;
pub mod qa;
pub mod texture;

// Re-export commonly used types for convenience
pub use crate::{
    clip::{ClipDriver, ClipSettings},
    config::Config,
    dialback::{DialbackPolicy, LoopOutcome, QaLoopController},
    error::{Result, TextureQaError},
    frame::Frame,
    qa::{QaEvaluator, QaResult, QaThresholds, SceneElement},
    texture::{signature, TextureConfig, TextureSpec, TextureTransform},
};
