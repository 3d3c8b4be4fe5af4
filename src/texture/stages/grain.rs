use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{to_channel, TextureStage};
use crate::{frame::Frame, texture::TextureConfig};

/// Peak channel offset at `grain_strength = 1.0`
pub const GRAIN_AMPLITUDE: f64 = 64.0;

/// Film grain: additive monochrome noise
///
/// One uniform sample in `[-1, 1)` is drawn per pixel in row-major order
/// from a PCG stream seeded with the caller's seed, and the same offset is
/// added to R, G and B so the grain reads as luminance noise rather than
/// colour speckle.
pub struct GrainStage;

impl TextureStage for GrainStage {
    fn name(&self) -> &'static str {
        "grain"
    }

    fn description(&self) -> &'static str {
        "Seeded monochrome film grain scaled by grain_strength"
    }

    fn is_active(&self, config: &TextureConfig) -> bool {
        config.grain_strength() > 0.0
    }

    fn render(&self, frame: &Frame, config: &TextureConfig, seed: u64) -> Frame {
        let amplitude = config.grain_strength() * GRAIN_AMPLITUDE;
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut out = frame.clone();

        for pixel in out.as_raw_mut().chunks_exact_mut(4) {
            let offset = rng.gen_range(-1.0..1.0) * amplitude;
            for channel in &mut pixel[..3] {
                *channel = to_channel(f64::from(*channel) + offset);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureSpec;

    fn grain(strength: f64) -> TextureConfig {
        TextureSpec { enable: true, grain_strength: strength, ..Default::default() }
            .validate()
            .unwrap()
    }

    #[test]
    fn test_zero_strength_is_inactive() {
        let frame = Frame::new_filled(8, 8, [120, 120, 120]);
        let out = GrainStage.apply(&frame, &grain(0.0), 42);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_same_seed_same_grain() {
        let frame = Frame::new_filled(16, 16, [128, 128, 128]);
        let a = GrainStage.apply(&frame, &grain(0.5), 7);
        let b = GrainStage.apply(&frame, &grain(0.5), 7);
        assert_eq!(a.as_raw(), b.as_raw());
        assert_ne!(a, frame);
    }

    #[test]
    fn test_different_seed_different_grain() {
        let frame = Frame::new_filled(16, 16, [128, 128, 128]);
        let a = GrainStage.apply(&frame, &grain(0.5), 1);
        let b = GrainStage.apply(&frame, &grain(0.5), 2);
        assert_ne!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_grain_is_bounded_and_keeps_alpha() {
        let frame = Frame::from_fn(16, 16, |_, _| [128, 128, 128, 77]);
        let out = GrainStage.apply(&frame, &grain(1.0), 99);
        for px in out.as_raw().chunks_exact(4) {
            assert_eq!(px[3], 77);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            let offset = (i32::from(px[0]) - 128).abs();
            assert!(offset <= GRAIN_AMPLITUDE as i32);
        }
    }
}
