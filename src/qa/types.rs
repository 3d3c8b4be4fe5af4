use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, TextureQaError};

/// Element type the legibility checks look at
pub const TEXT_ELEMENT: &str = "text";

/// One placed element of a scene, as handed over by the renderer
///
/// Fields are kept as raw JSON values so a malformed element (a numeric
/// colour, a string inside the bbox) is reported as a QA failure for that
/// element instead of failing to load the whole scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneElement {
    /// Identifier used in failure messages; `element[<index>]` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,

    /// Foreground colour, `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,

    /// `[x, y, w, h]`, normalized to the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Value>,

    /// Known background colour; sampled from the frame when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Value>,
}

impl SceneElement {
    /// A text element with a foreground colour and a bounding box
    pub fn text<S: Into<String>>(id: S, color: &str, bbox: [f64; 4]) -> Self {
        Self {
            id: Some(Value::String(id.into())),
            kind: Some(Value::from(TEXT_ELEMENT)),
            color: Some(Value::from(color)),
            bbox: Some(Value::from(bbox.to_vec())),
            background: None,
        }
    }

    /// Set an explicit background colour
    pub fn with_background(mut self, background: &str) -> Self {
        self.background = Some(Value::from(background));
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind.as_ref().and_then(Value::as_str) == Some(TEXT_ELEMENT)
    }

    /// Identifier for messages, falling back to the element's position
    pub fn label(&self, index: usize) -> String {
        match &self.id {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => format!("element[{}]", index),
        }
    }

    /// Parse placement JSON: an array of elements or an object with an `elements` array
    ///
    /// Entries that are not JSON objects cannot describe an element and are
    /// skipped. Every object loads, whatever its field types.
    pub fn parse_scene(json: &str) -> Result<Vec<SceneElement>> {
        let entries = match serde_json::from_str::<SceneDocument>(json)? {
            SceneDocument::Elements(entries) | SceneDocument::Scene { elements: entries } => entries,
        };

        let mut elements = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.is_object() {
                warn!("Skipping placement entry {}: not an object", index);
                continue;
            }
            elements.push(serde_json::from_value(entry)?);
        }
        Ok(elements)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SceneDocument {
    Elements(Vec<Value>),
    Scene { elements: Vec<Value> },
}

/// Legibility thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaThresholds {
    /// Minimum WCAG contrast ratio between text and its background
    pub contrast_min_ratio: f64,

    /// Fraction of each axis covered by the centred safe rectangle
    pub safe_area_pct: f64,
}

impl Default for QaThresholds {
    fn default() -> Self {
        Self {
            contrast_min_ratio: 4.5,
            safe_area_pct: 0.9,
        }
    }
}

impl QaThresholds {
    pub fn validate(&self) -> Result<()> {
        if !self.contrast_min_ratio.is_finite() || self.contrast_min_ratio < 1.0 {
            return Err(TextureQaError::invalid_value(
                "qa.contrast_min_ratio",
                self.contrast_min_ratio,
            ));
        }

        if !(self.safe_area_pct > 0.0 && self.safe_area_pct <= 1.0) {
            return Err(TextureQaError::invalid_value("qa.safe_area_pct", self.safe_area_pct));
        }

        Ok(())
    }
}

/// Verdict of one evaluation
///
/// `ok` is true exactly when `fails` is empty. Warnings never affect it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaResult {
    ok: bool,
    fails: Vec<String>,
    warnings: Vec<String>,
    details: BTreeMap<String, f64>,
}

impl Default for QaResult {
    fn default() -> Self {
        Self {
            ok: true,
            fails: Vec::new(),
            warnings: Vec::new(),
            details: BTreeMap::new(),
        }
    }
}

impl QaResult {
    /// A passing result with nothing recorded
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn fails(&self) -> &[String] {
        &self.fails
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Measured values by check name, e.g. `contrast:title`
    pub fn details(&self) -> &BTreeMap<String, f64> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<f64> {
        self.details.get(key).copied()
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.fails.push(message);
        self.ok = false;
    }

    pub(crate) fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub(crate) fn record(&mut self, key: String, value: f64) {
        self.details.insert(key, value);
    }
}
