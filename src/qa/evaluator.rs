use serde_json::Value;
use tracing::debug;

use super::color::{contrast_ratio, parse_hex_color};
use super::types::{QaResult, QaThresholds, SceneElement};
use crate::frame::Frame;

/// Warn when contrast clears the minimum by less than this factor
const MARGINAL_CONTRAST_FACTOR: f64 = 1.1;

/// Tolerance for boxes that sit exactly on the safe-area edge
const EDGE_EPSILON: f64 = 1e-9;

/// Normalized `[x, y, w, h]`
#[derive(Debug, Clone, Copy, PartialEq)]
struct BBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl BBox {
    fn parse(raw: Option<&Value>) -> Option<Self> {
        let values = raw?
            .as_array()?
            .iter()
            .map(Value::as_f64)
            .collect::<Option<Vec<f64>>>()?;
        match values.as_slice() {
            &[x, y, w, h] if [x, y, w, h].iter().all(|v| v.is_finite()) && w >= 0.0 && h >= 0.0 => {
                Some(Self { x, y, w, h })
            }
            _ => None,
        }
    }

    /// Pixel rectangle `[x0, x1) × [y0, y1)` covered by the box
    fn to_pixels(self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let (w, h) = (f64::from(width), f64::from(height));
        let x0 = (self.x * w).floor().max(0.0) as u32;
        let y0 = (self.y * h).floor().max(0.0) as u32;
        let x1 = ((self.x + self.w) * w).ceil().max(0.0) as u32;
        let y1 = ((self.y + self.h) * h).ceil().max(0.0) as u32;
        (x0, y0, x1, y1)
    }
}

/// Inspects a rendered frame for text legibility problems
///
/// Two checks run for every element of type `text`: WCAG contrast of its
/// colour against the background, and placement inside the centred safe
/// area. Broken element data is reported as a failure for that element and
/// evaluation carries on with the rest of the scene.
#[derive(Debug, Clone, Default)]
pub struct QaEvaluator {
    thresholds: QaThresholds,
}

impl QaEvaluator {
    pub fn new(thresholds: QaThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QaThresholds {
        &self.thresholds
    }

    /// Evaluate `frame` against its placement metadata
    ///
    /// Without metadata there is nothing to check and the result passes.
    pub fn evaluate(&self, frame: &Frame, placement: Option<&[SceneElement]>) -> QaResult {
        let mut result = QaResult::pass();
        let Some(elements) = placement else {
            return result;
        };

        let mut text_elements = 0;
        for (index, element) in elements.iter().enumerate() {
            if !element.is_text() {
                continue;
            }
            text_elements += 1;
            let id = element.label(index);

            let bbox = BBox::parse(element.bbox.as_ref());
            match bbox {
                Some(bbox) => self.check_safe_area(&id, bbox, &mut result),
                None => result.fail(format!("invalid_bbox:{} {}", id, describe(element.bbox.as_ref()))),
            }

            let Some(foreground) = as_color(element.color.as_ref()) else {
                result.fail(format!("invalid_color:{} {}", id, describe(element.color.as_ref())));
                continue;
            };

            let Some(background) = self.background_sample(frame, element, bbox, &id, &mut result) else {
                continue;
            };

            self.check_contrast(&id, foreground, background, &mut result);
        }

        if text_elements == 0 {
            result.warn("no_text_elements".to_string());
        }

        debug!(
            "QA evaluated {} text elements: {} fails, {} warnings",
            text_elements,
            result.fails().len(),
            result.warnings().len()
        );
        result
    }

    /// Explicit background colour, else the mean of the frame under the box, else black
    fn background_sample(
        &self,
        frame: &Frame,
        element: &SceneElement,
        bbox: Option<BBox>,
        id: &str,
        result: &mut QaResult,
    ) -> Option<[u8; 3]> {
        if let Some(raw) = &element.background {
            return match as_color(Some(raw)) {
                Some(color) => Some(color),
                None => {
                    result.fail(format!("invalid_background:{} {}", id, raw));
                    None
                }
            };
        }

        let sampled = bbox.and_then(|bbox| {
            let (x0, y0, x1, y1) = bbox.to_pixels(frame.width(), frame.height());
            frame.mean_rgb(x0, y0, x1, y1)
        });

        Some(sampled.unwrap_or_else(|| {
            result.warn(format!("background_fallback:{}", id));
            [0, 0, 0]
        }))
    }

    fn check_contrast(&self, id: &str, foreground: [u8; 3], background: [u8; 3], result: &mut QaResult) {
        let ratio = contrast_ratio(foreground, background);
        let min = self.thresholds.contrast_min_ratio;
        result.record(format!("contrast:{}", id), ratio);

        if ratio < min {
            result.fail(format!("contrast:{} {:.2} < {:.2}", id, ratio, min));
        } else if ratio < min * MARGINAL_CONTRAST_FACTOR {
            result.warn(format!("contrast_marginal:{} {:.2}", id, ratio));
        }
    }

    fn check_safe_area(&self, id: &str, bbox: BBox, result: &mut QaResult) {
        let margin = (1.0 - self.thresholds.safe_area_pct) / 2.0;
        let (lo, hi) = (margin, 1.0 - margin);

        let overflows = [
            ("left", lo - bbox.x),
            ("top", lo - bbox.y),
            ("right", bbox.x + bbox.w - hi),
            ("bottom", bbox.y + bbox.h - hi),
        ];

        let worst = overflows.iter().map(|&(_, o)| o).fold(0.0, f64::max);
        result.record(format!("safe_area:{}", id), worst);

        let edges: Vec<&str> = overflows
            .iter()
            .filter(|&&(_, overflow)| overflow > EDGE_EPSILON)
            .map(|&(edge, _)| edge)
            .collect();
        if !edges.is_empty() {
            result.fail(format!("safe_area:{} outside {}", id, edges.join(",")));
        }
    }
}

fn as_color(raw: Option<&Value>) -> Option<[u8; 3]> {
    raw.and_then(Value::as_str).and_then(parse_hex_color)
}

fn describe(raw: Option<&Value>) -> String {
    raw.map_or_else(|| "missing".to_string(), Value::to_string)
}
