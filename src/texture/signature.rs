//! Content-addressed fingerprints for texture configurations.
//!
//! The signature is a SHA-256 over a canonical text form of the config: keys
//! in lexicographic order, floats at a fixed precision. Two configs built in
//! different ways (different key order in the source file, `0.12` vs `0.120`)
//! therefore collapse to one signature. It is a cache and dedup key, not a
//! security token.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::config::TextureConfig;

const SCHEME: &str = "texture-config/v1";

/// Decimal places kept when canonicalizing floats
const FLOAT_PRECISION: usize = 9;

/// Fixed-length fingerprint of a [`TextureConfig`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature([u8; 32]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> String {
        let mut hex = self.to_string();
        hex.truncate(12);
        hex
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.short())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fingerprint of a validated config
pub fn signature(config: &TextureConfig) -> Signature {
    digest(&canonical_form(config), None)
}

/// Fingerprint of a config together with the grain seed
///
/// Identical `(frame, config, seed)` always produce identical output, so this
/// is a sound memoization key for transform results of a given frame.
pub fn signature_with_seed(config: &TextureConfig, seed: u64) -> Signature {
    digest(&canonical_form(config), Some(seed))
}

fn digest(canonical: &str, seed: Option<u64>) -> Signature {
    let mut hasher = Sha256::new();
    hasher.update(SCHEME.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical.as_bytes());
    if let Some(seed) = seed {
        hasher.update(b"\nseed=");
        hasher.update(seed.to_string().as_bytes());
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    Signature(bytes)
}

/// `key=value` pairs joined by `;`, keys sorted
pub(crate) fn canonical_form(config: &TextureConfig) -> String {
    let halftone = config.halftone();

    let mut fields = BTreeMap::new();
    fields.insert("enable", config.enabled().to_string());
    fields.insert("grain_strength", canonical_float(config.grain_strength()));
    fields.insert("feather_px", canonical_float(config.feather_px()));
    fields.insert("posterize_levels", config.posterize_levels().to_string());
    fields.insert("halftone.enable", halftone.enabled().to_string());
    fields.insert("halftone.cell_px", halftone.cell_px().to_string());
    fields.insert("halftone.angle_deg", canonical_float(halftone.angle_deg()));
    fields.insert("halftone.opacity", canonical_float(halftone.opacity()));

    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(";")
}

fn canonical_float(value: f64) -> String {
    let formatted = format!("{:.*}", FLOAT_PRECISION, value);
    // -0.0 and values that round to zero from below print as "-0.000000000"
    if formatted.trim_start_matches('-').bytes().all(|b| b == b'0' || b == b'.') {
        format!("{:.*}", FLOAT_PRECISION, 0.0)
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{HalftoneSpec, TextureSpec};

    fn grain(strength: f64) -> TextureConfig {
        TextureSpec { grain_strength: strength, ..Default::default() }
            .validate()
            .unwrap()
    }

    #[test]
    fn test_independently_built_configs_match() {
        let a = grain(0.12);
        let b = grain(0.12);
        assert_eq!(signature(&a), signature(&b));
        assert_ne!(signature(&a), signature(&grain(0.15)));
    }

    #[test]
    fn test_key_order_and_float_spelling_do_not_matter() {
        let a: TextureSpec = toml::from_str(
            "enable = true\ngrain_strength = 0.120\nfeather_px = 2.0\n[halftone]\nopacity = 0.8\nenable = true\n",
        )
        .unwrap();
        let b: TextureSpec = serde_json::from_str(
            r#"{"halftone": {"enable": true, "opacity": 0.80}, "feather_px": 2, "grain_strength": 0.12, "enable": true}"#,
        )
        .unwrap();

        let a = a.validate().unwrap();
        let b = b.validate().unwrap();
        assert_eq!(signature(&a), signature(&b));
    }

    #[test]
    fn test_every_field_changes_the_signature() {
        let base = TextureSpec {
            enable: true,
            grain_strength: 0.4,
            feather_px: 1.5,
            posterize_levels: 6,
            halftone: HalftoneSpec { enable: true, cell_px: 8, angle_deg: 30.0, opacity: 0.5 },
        };
        let variants = vec![
            TextureSpec { enable: false, ..base.clone() },
            TextureSpec { grain_strength: 0.4 + 1e-6, ..base.clone() },
            TextureSpec { feather_px: 1.6, ..base.clone() },
            TextureSpec { posterize_levels: 7, ..base.clone() },
            TextureSpec { halftone: HalftoneSpec { enable: false, ..base.halftone.clone() }, ..base.clone() },
            TextureSpec { halftone: HalftoneSpec { cell_px: 9, ..base.halftone.clone() }, ..base.clone() },
            TextureSpec { halftone: HalftoneSpec { angle_deg: 30.5, ..base.halftone.clone() }, ..base.clone() },
            TextureSpec { halftone: HalftoneSpec { opacity: 0.55, ..base.halftone.clone() }, ..base.clone() },
        ];

        let base_sig = signature(&base.validate().unwrap());
        for variant in variants {
            let sig = signature(&variant.validate().unwrap());
            assert_ne!(base_sig, sig, "{:?} collided with the base config", variant);
        }
    }

    #[test]
    fn test_negative_zero_is_canonical() {
        let a = TextureSpec {
            halftone: HalftoneSpec { angle_deg: -0.0, ..Default::default() },
            ..Default::default()
        };
        let b = TextureSpec {
            halftone: HalftoneSpec { angle_deg: 0.0, ..Default::default() },
            ..Default::default()
        };
        assert_eq!(
            signature(&a.validate().unwrap()),
            signature(&b.validate().unwrap())
        );
    }

    #[test]
    fn test_seed_is_part_of_cache_key() {
        let config = grain(0.3);
        assert_eq!(signature_with_seed(&config, 7), signature_with_seed(&config, 7));
        assert_ne!(signature_with_seed(&config, 7), signature_with_seed(&config, 8));
        assert_ne!(signature_with_seed(&config, 7), signature(&config));
    }

    #[test]
    fn test_display_is_fixed_length_hex() {
        let sig = signature(&TextureConfig::default());
        let hex = sig.to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig.short(), &hex[..12]);
        assert_eq!(serde_json::to_value(sig).unwrap(), serde_json::json!(hex));
    }
}
