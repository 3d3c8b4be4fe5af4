use super::TextureStage;
use crate::{frame::Frame, texture::TextureConfig};

/// Value every channel collapses to at a single level
pub const SINGLE_LEVEL_VALUE: u8 = 128;

/// Posterization: per-channel quantization to `posterize_levels` steps
///
/// Levels are spread evenly over `0..=255`, so two levels give pure 0/255
/// and 256 or more levels reproduce the input exactly.
pub struct PosterizeStage;

impl PosterizeStage {
    /// Lookup table mapping each input value to its quantized value
    pub fn lookup_table(levels: u32) -> [u8; 256] {
        let mut lut = [0u8; 256];
        for (value, slot) in lut.iter_mut().enumerate() {
            *slot = quantize(value as u8, levels);
        }
        lut
    }
}

fn quantize(value: u8, levels: u32) -> u8 {
    match levels {
        0 | 1 => SINGLE_LEVEL_VALUE,
        l if l >= 256 => value,
        l => {
            let step = 255.0 / f64::from(l - 1);
            ((f64::from(value) / step).round() * step).round().min(255.0) as u8
        }
    }
}

impl TextureStage for PosterizeStage {
    fn name(&self) -> &'static str {
        "posterize"
    }

    fn description(&self) -> &'static str {
        "Quantizes each colour channel to posterize_levels steps"
    }

    fn is_active(&self, config: &TextureConfig) -> bool {
        config.posterize_levels() < 256
    }

    fn render(&self, frame: &Frame, config: &TextureConfig, _seed: u64) -> Frame {
        let lut = Self::lookup_table(config.posterize_levels());
        let mut out = frame.clone();
        for pixel in out.as_raw_mut().chunks_exact_mut(4) {
            for channel in &mut pixel[..3] {
                *channel = lut[usize::from(*channel)];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureSpec;

    fn levels(n: u32) -> TextureConfig {
        TextureSpec { enable: true, posterize_levels: n, ..Default::default() }
            .validate()
            .unwrap()
    }

    fn gradient() -> Frame {
        Frame::from_fn(256, 1, |x, _| [x as u8, 255 - x as u8, (x as u8) / 2, 200])
    }

    #[test]
    fn test_single_level_collapses_channel() {
        let out = PosterizeStage.apply(&gradient(), &levels(1), 0);
        for px in out.as_raw().chunks_exact(4) {
            assert_eq!(&px[..3], &[SINGLE_LEVEL_VALUE; 3]);
            assert_eq!(px[3], 200);
        }
    }

    #[test]
    fn test_two_levels_are_binary() {
        let lut = PosterizeStage::lookup_table(2);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[127], 0);
        assert_eq!(lut[128], 255);
        assert_eq!(lut[255], 255);
    }

    #[test]
    fn test_distinct_values_match_level_count() {
        for n in [2u32, 3, 4, 8, 16] {
            let mut lut = PosterizeStage::lookup_table(n).to_vec();
            lut.dedup();
            assert_eq!(lut.len(), n as usize);
        }
    }

    #[test]
    fn test_many_levels_are_identity() {
        let frame = gradient();
        assert!(!PosterizeStage.is_active(&levels(256)));
        assert_eq!(PosterizeStage.apply(&frame, &levels(300), 0), frame);
    }

    #[test]
    fn test_more_levels_are_closer_to_input() {
        let error = |n: u32| -> u32 {
            let lut = PosterizeStage::lookup_table(n);
            (0..=255u8)
                .map(|v| u32::from(v.abs_diff(lut[usize::from(v)])))
                .sum()
        };
        assert!(error(4) < error(2));
        assert!(error(16) < error(4));
    }
}
