//! Content fingerprinting for raw inputs.
//!
//! A [`Fingerprint`] is the lowercase hex SHA-256 of an input's normalized
//! form. It is the cache key for canonical records, so two inputs share a
//! cached answer exactly when their normalized forms are byte-identical.
//!
//! # Normalization
//!
//! | Input | Normalized form |
//! |-------|-----------------|
//! | Image bytes | standard base64 encoding, then cleaned as below |
//! | Image base64 | `data:` URI prefix removed, all whitespace removed |
//! | Text | NFD, combining marks dropped, lower-cased, punctuation dropped, whitespace collapsed |
//!
//! Image payloads shorter than the configured minimum, or containing bytes
//! outside the base64 alphabets, are rejected with
//! [`CareError::InvalidInput`]. Text that normalizes to nothing is rejected
//! the same way.
//!
//! Fingerprints never encode locale or record kind.
//!
//! # Example
//!
//! ```rust
//! use care_cache_core::fingerprint::{fingerprint, Input};
//!
//! let a = fingerprint(&Input::Text("Café  au LAIT!".into()), 100).unwrap();
//! let b = fingerprint(&Input::Text("cafe au lait".into()), 100).unwrap();
//! assert_eq!(a, b);
//! ```

use std::fmt;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{CareError, Result};

/// Default minimum length of a cleaned base64 image payload.
///
/// Anything shorter cannot be a plausible compressed thumbnail.
pub const DEFAULT_MIN_IMAGE_PAYLOAD: usize = 100;

/// Raw input handed to the engine by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Encoded image file bytes (JPEG, PNG, ...).
    ImageBytes(Vec<u8>),
    /// Base64 image payload, optionally as a `data:` URI.
    ImageBase64(String),
    /// Free-text query.
    Text(String),
}

/// Deterministic content identifier for an input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an existing identifier, e.g. one read back from storage.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What gets sent to the model for a given input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Cleaned base64 image data, without any `data:` prefix.
    Image(String),
    /// The caller's query, trimmed but otherwise as typed.
    Text(String),
}

/// A fingerprinted input, ready for cache lookup and model dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInput {
    pub fingerprint: Fingerprint,
    pub payload: Payload,
}

/// Compute the fingerprint of an input.
pub fn fingerprint(input: &Input, min_image_payload: usize) -> Result<Fingerprint> {
    prepare(input, min_image_payload).map(|p| p.fingerprint)
}

/// Validate and normalize an input, returning its fingerprint and the
/// payload to forward to the model.
pub fn prepare(input: &Input, min_image_payload: usize) -> Result<PreparedInput> {
    match input {
        Input::ImageBytes(bytes) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            prepare_image(&encoded, min_image_payload)
        }
        Input::ImageBase64(raw) => prepare_image(raw, min_image_payload),
        Input::Text(raw) => {
            let normalized = normalize_text(raw);
            if normalized.is_empty() {
                return Err(CareError::InvalidInput(
                    "text query is empty after normalization".to_string(),
                ));
            }
            Ok(PreparedInput {
                fingerprint: digest(&normalized),
                payload: Payload::Text(raw.trim().to_string()),
            })
        }
    }
}

fn prepare_image(raw: &str, min_image_payload: usize) -> Result<PreparedInput> {
    let cleaned = clean_image_payload(raw);
    if cleaned.len() < min_image_payload {
        return Err(CareError::InvalidInput(format!(
            "image payload too small: {} chars (minimum {})",
            cleaned.len(),
            min_image_payload
        )));
    }
    if let Some(bad) = cleaned.chars().find(|c| !is_base64_char(*c)) {
        return Err(CareError::InvalidInput(format!(
            "image payload is not base64 (found {:?})",
            bad
        )));
    }
    Ok(PreparedInput {
        fingerprint: digest(&cleaned),
        payload: Payload::Image(cleaned),
    })
}

/// Strip a `data:` URI prefix and every whitespace character.
pub fn clean_image_payload(raw: &str) -> String {
    let trimmed = raw.trim();
    let body = if trimmed
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
    {
        trimmed
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or("")
    } else {
        trimmed
    };
    body.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '-' | '_')
}

/// Normalize a free-text query for fingerprinting.
///
/// Decomposes to NFD, drops combining marks, lower-cases, drops anything
/// that is not a letter, digit or whitespace, and collapses whitespace.
pub fn normalize_text(raw: &str) -> String {
    let stripped: String = raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hash a short label (batch group names, suggestions) for use as a
/// translation key.
pub fn hash_label(label: &str) -> String {
    digest(label.trim()).0
}

fn digest(normalized: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_payload(len: usize) -> String {
        "QUJD".repeat(len / 4 + 1)[..len].to_string()
    }

    #[test]
    fn test_text_normalization() {
        assert_eq!(normalize_text("  Café,  au\tLAIT!! "), "cafe au lait");
        assert_eq!(normalize_text("Wäsche 40°C?"), "wasche 40c");
    }

    #[test]
    fn test_text_fingerprint_is_deterministic() {
        let a = fingerprint(&Input::Text("How do I wash wool?".into()), 100).unwrap();
        let b = fingerprint(&Input::Text("how do i wash WOOL".into()), 100).unwrap();
        let c = fingerprint(&Input::Text("how do i wash silk".into()), 100).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_empty_text_rejected() {
        let err = fingerprint(&Input::Text(" ?! ".into()), 100).unwrap_err();
        assert!(matches!(err, CareError::InvalidInput(_)));
    }

    #[test]
    fn test_data_uri_and_whitespace_ignored() {
        let body = image_payload(160);
        let wrapped = format!(
            "data:image/jpeg;base64,{}\n{}",
            &body[..80],
            &body[80..]
        );
        let a = fingerprint(&Input::ImageBase64(body.clone()), 100).unwrap();
        let b = fingerprint(&Input::ImageBase64(wrapped), 100).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_data_uri_scheme_is_case_insensitive() {
        let body = image_payload(160);
        let upper = format!("DATA:image/jpeg;base64,{}", body);
        let mixed = format!("Data:image/png;base64,{}", body);
        let plain = fingerprint(&Input::ImageBase64(body), 100).unwrap();
        assert_eq!(fingerprint(&Input::ImageBase64(upper), 100).unwrap(), plain);
        assert_eq!(fingerprint(&Input::ImageBase64(mixed), 100).unwrap(), plain);
    }

    #[test]
    fn test_small_image_rejected() {
        let err = fingerprint(&Input::ImageBase64(image_payload(40)), 100).unwrap_err();
        assert!(matches!(err, CareError::InvalidInput(_)));
    }

    #[test]
    fn test_non_base64_image_rejected() {
        let mut payload = image_payload(120);
        payload.push('!');
        let err = fingerprint(&Input::ImageBase64(payload), 100).unwrap_err();
        assert!(matches!(err, CareError::InvalidInput(_)));
    }

    #[test]
    fn test_image_bytes_match_their_base64() {
        let bytes: Vec<u8> = (0..200u16).map(|b| (b % 251) as u8).collect();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let a = prepare(&Input::ImageBytes(bytes), 100).unwrap();
        let b = prepare(&Input::ImageBase64(encoded.clone()), 100).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.payload, Payload::Image(encoded));
    }

    #[test]
    fn test_prefix_collision_distinguished() {
        let base = image_payload(200);
        let mut other = base.clone();
        other.replace_range(199..200, "Z");
        let a = fingerprint(&Input::ImageBase64(base), 100).unwrap();
        let b = fingerprint(&Input::ImageBase64(other), 100).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_label_trims() {
        assert_eq!(hash_label(" Darks "), hash_label("Darks"));
        assert_ne!(hash_label("Darks"), hash_label("Whites"));
    }
}
