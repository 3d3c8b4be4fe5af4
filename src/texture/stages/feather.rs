use super::TextureStage;
use crate::{frame::Frame, texture::TextureConfig};

/// 16.16 fixed-point unity
const Q16_ONE: u32 = 1 << 16;

/// Below this sigma the outer taps round to zero and the blur vanishes
const MIN_SIGMA: f64 = 0.5;

/// Feathering: separable Gaussian blur of the colour channels
///
/// The kernel radius is `ceil(feather_px)` and sigma is `feather_px / 2`,
/// never below 0.5, so any non-zero radius softens edges.
/// Weights are quantized to 16.16 fixed point so the result is bit-exact on
/// every platform. Edges are clamped.
pub struct FeatherStage;

impl TextureStage for FeatherStage {
    fn name(&self) -> &'static str {
        "feather"
    }

    fn description(&self) -> &'static str {
        "Gaussian edge softening with radius feather_px"
    }

    fn is_active(&self, config: &TextureConfig) -> bool {
        config.feather_px() > 0.0
    }

    fn render(&self, frame: &Frame, config: &TextureConfig, _seed: u64) -> Frame {
        let (width, height) = frame.dimensions();
        if frame.is_empty() {
            return frame.clone();
        }

        let feather = config.feather_px();
        let max_radius = width.max(height) as usize;
        let radius = (feather.ceil() as usize).clamp(1, max_radius);
        let kernel = gaussian_kernel_q16(radius, (feather / 2.0).max(MIN_SIGMA));

        let mut tmp = frame.clone();
        horizontal_pass(frame.as_raw(), tmp.as_raw_mut(), width, height, &kernel);
        let mut out = frame.clone();
        vertical_pass(tmp.as_raw(), out.as_raw_mut(), width, height, &kernel);
        out
    }
}

/// Normalized Gaussian weights for offsets `-radius..=radius`, summing to exactly 1.0 in Q16
fn gaussian_kernel_q16(radius: usize, sigma: f64) -> Vec<u32> {
    let r = radius as i64;
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|w| ((w / sum) * f64::from(Q16_ONE)).round() as u32)
        .collect();

    // Put the rounding drift on the centre tap
    let total: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let center = &mut weights[radius];
    *center = (i64::from(*center) + i64::from(Q16_ONE) - total).max(0) as u32;
    weights
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[u32]) {
    let w = width as usize;
    let radius = (kernel.len() / 2) as isize;
    for y in 0..height as usize {
        let row = y * w * 4;
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x as isize + k as isize - radius).clamp(0, w as isize - 1) as usize;
                let idx = row + sx * 4;
                for c in 0..3 {
                    acc[c] += u64::from(weight) * u64::from(src[idx + c]);
                }
            }
            let out = row + x * 4;
            for c in 0..3 {
                dst[out + c] = round_q16(acc[c]);
            }
            dst[out + 3] = src[out + 3];
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[u32]) {
    let w = width as usize;
    let h = height as usize;
    let radius = (kernel.len() / 2) as isize;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - radius).clamp(0, h as isize - 1) as usize;
                let idx = (sy * w + x) * 4;
                for c in 0..3 {
                    acc[c] += u64::from(weight) * u64::from(src[idx + c]);
                }
            }
            let out = (y * w + x) * 4;
            for c in 0..3 {
                dst[out + c] = round_q16(acc[c]);
            }
            dst[out + 3] = src[out + 3];
        }
    }
}

fn round_q16(acc: u64) -> u8 {
    ((acc + u64::from(Q16_ONE / 2)) >> 16).min(255) as u8
}
