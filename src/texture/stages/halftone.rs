use std::f64::consts::PI;

use super::{to_channel, TextureStage};
use crate::{frame::Frame, texture::TextureConfig};

/// Halftone: a rotated dot screen over the frame
///
/// Pixel centres are rotated by `angle_deg` into screen space and binned
/// into `cell_px` cells. Each cell holds one dot at its centre whose area is
/// proportional to the darkness of the pixel being drawn. Ink pixels are
/// pulled towards black by `opacity`; paper pixels are left alone.
pub struct HalftoneStage;

impl TextureStage for HalftoneStage {
    fn name(&self) -> &'static str {
        "halftone"
    }

    fn description(&self) -> &'static str {
        "Rotated dot screen at cell_px spacing blended at opacity"
    }

    fn is_active(&self, config: &TextureConfig) -> bool {
        let halftone = config.halftone();
        halftone.enabled() && halftone.opacity() > 0.0
    }

    fn render(&self, frame: &Frame, config: &TextureConfig, _seed: u64) -> Frame {
        let halftone = config.halftone();
        let cell = f64::from(halftone.cell_px());
        let keep = 1.0 - halftone.opacity();
        let (sin, cos) = halftone.angle_deg().to_radians().sin_cos();

        let width = frame.width() as usize;
        let mut out = frame.clone();
        for (i, pixel) in out.as_raw_mut().chunks_exact_mut(4).enumerate() {
            let px = (i % width) as f64 + 0.5;
            let py = (i / width) as f64 + 0.5;

            let u = px * cos + py * sin;
            let v = py * cos - px * sin;
            let du = u - ((u / cell).floor() + 0.5) * cell;
            let dv = v - ((v / cell).floor() + 0.5) * cell;
            let distance = du.hypot(dv);

            let luma = (0.2126 * f64::from(pixel[0])
                + 0.7152 * f64::from(pixel[1])
                + 0.0722 * f64::from(pixel[2]))
                / 255.0;
            let darkness = (1.0 - luma).max(0.0);
            let radius = cell * (darkness / PI).sqrt();

            if distance < radius {
                for channel in &mut pixel[..3] {
                    *channel = to_channel(f64::from(*channel) * keep);
                }
            }
        }

        out
    }
}
