//! Durable storage abstraction and cache key layout.
//!
//! The [`DurableStore`] trait is the second (persistent) tier of the
//! versioned cache: a plain string-keyed get/set with string values and no
//! transactions. Implementations must be `Send + Sync` to work with async
//! runtimes.
//!
//! Keys are built by [`storage_key`] as
//! `namespace:version:key`, with version and key percent-encoded so that
//! arbitrary characters (including `:`) can never make two different
//! `(namespace, version, key)` triples collide.

pub mod memory;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::RecordKind;

/// Persistent string key/value store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](DurableStore::get) | Read a value, `None` when absent |
/// | [`set`](DurableStore::set) | Insert or overwrite a value |
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Cache partition. Each namespace has its own version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Canonical records of one kind, keyed by fingerprint.
    Record(RecordKind),
    /// Translated records of one kind, keyed by `fingerprint:locale`.
    Translation(RecordKind),
    /// Translated batch labels, keyed by `hash(label):locale`.
    Label,
}

impl Namespace {
    pub fn name(&self) -> String {
        match self {
            Namespace::Record(kind) => kind.as_str().to_string(),
            Namespace::Translation(kind) => format!("translation.{}", kind.as_str()),
            Namespace::Label => "translation.label".to_string(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Build the storage key for `(namespace, version, key)`.
///
/// ```rust
/// use care_cache_core::models::RecordKind;
/// use care_cache_core::store::{storage_key, Namespace};
///
/// let key = storage_key(Namespace::Translation(RecordKind::Garment), "v2", "abc:pt-BR");
/// assert_eq!(key, "translation.garment:v2:abc%3Apt-BR");
/// ```
pub fn storage_key(namespace: Namespace, version: &str, key: &str) -> String {
    format!(
        "{}:{}:{}",
        namespace.name(),
        percent_encode(version),
        percent_encode(key)
    )
}

/// Split a storage key back into its namespace and version segments.
pub fn key_prefix(storage_key: &str) -> Option<(&str, &str)> {
    let mut parts = storage_key.splitn(3, ':');
    let namespace = parts.next()?;
    let version = parts.next()?;
    parts.next()?;
    Some((namespace, version))
}

/// Undo the percent-encoding applied to a version or key segment.
pub fn decode_segment(raw: &str) -> String {
    url::form_urlencoded::parse(format!("s={}", raw).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn percent_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_names() {
        assert_eq!(Namespace::Record(RecordKind::Stain).name(), "stain");
        assert_eq!(
            Namespace::Translation(RecordKind::Batch).name(),
            "translation.batch"
        );
        assert_eq!(Namespace::Label.name(), "translation.label");
    }

    #[test]
    fn test_keys_do_not_collide_across_segments() {
        let a = storage_key(Namespace::Record(RecordKind::Garment), "v1:x", "y");
        let b = storage_key(Namespace::Record(RecordKind::Garment), "v1", "x:y");
        assert_ne!(a, b);
        assert_eq!(
            storage_key(Namespace::Record(RecordKind::Garment), "v1", "a b/c"),
            "garment:v1:a+b%2Fc"
        );
    }

    #[test]
    fn test_key_prefix() {
        let key = storage_key(Namespace::Label, "v3", "deadbeef:el");
        assert_eq!(key_prefix(&key), Some(("translation.label", "v3")));
        assert_eq!(key_prefix("loose"), None);
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("v1%3Abeta"), "v1:beta");
        assert_eq!(decode_segment("a+b%2Fc"), "a b/c");
        assert_eq!(decode_segment("v2"), "v2");
    }
}
