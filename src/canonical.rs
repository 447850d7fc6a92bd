//! Canonicalization orchestrator.
//!
//! Produces exactly one canonical record per `(kind, fingerprint)` and
//! cache version. A fingerprint moves through three states:
//!
//! ```text
//! UNSEEN ──miss──▶ IN_FLIGHT ──model reply──▶ RESOLVED (cached)
//!                      │
//!                      └── failure ──▶ UNSEEN (default record returned)
//! ```
//!
//! Concurrent callers for the same fingerprint share one flight, so the
//! model is invoked at most once while their requests overlap. A failed
//! model call is never cached; the next caller tries again.

use std::sync::Arc;
use std::time::Duration;

use care_cache_core::fingerprint::{prepare, Fingerprint, Input, Payload, PreparedInput};
use care_cache_core::normalize::normalize;
use care_cache_core::store::{storage_key, Namespace};
use care_cache_core::{CanonicalRecord, RecordKind, Result};

use crate::cache::VersionedCache;
use crate::config::{CacheVersions, Config};
use crate::prompts;
use crate::single_flight::SingleFlight;
use crate::transport::{call_json, ModelMode, ModelRequest, ModelTransport};

/// Where a canonical record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Model,
    /// Kind defaults after a failed model call. Never cached, and not worth
    /// translating.
    Fallback,
}

/// A canonical record together with the fingerprint it is cached under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalized {
    pub fingerprint: Fingerprint,
    pub record: CanonicalRecord,
    pub source: Source,
}

impl Canonicalized {
    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}

/// Resolves inputs to canonical records through the cache.
#[derive(Clone)]
pub struct Canonicalizer {
    inner: Arc<Inner>,
}

struct Inner {
    cache: Arc<VersionedCache>,
    transport: Arc<dyn ModelTransport>,
    versions: CacheVersions,
    base_locale: String,
    min_image_payload: usize,
    timeout: Duration,
    flights: SingleFlight<(CanonicalRecord, Source)>,
}

impl Canonicalizer {
    pub fn new(
        config: &Config,
        cache: Arc<VersionedCache>,
        transport: Arc<dyn ModelTransport>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                transport,
                versions: config.cache.versions.clone(),
                base_locale: config.cache.base_locale.clone(),
                min_image_payload: config.cache.min_image_payload,
                timeout: config.model.timeout(),
                flights: SingleFlight::new(),
            }),
        }
    }

    /// Return the canonical record of `kind` for `input`.
    ///
    /// Only invalid input is an error. Model and storage failures yield the
    /// default record for `kind` with [`Source::Fallback`], which is not
    /// cached.
    pub async fn canonicalize(&self, input: &Input, kind: RecordKind) -> Result<Canonicalized> {
        let prepared = prepare(input, self.inner.min_image_payload)?;
        let fingerprint = prepared.fingerprint.clone();

        let namespace = Namespace::Record(kind);
        let version = self.inner.versions.for_namespace(namespace);
        if let Some(record) = self
            .inner
            .cache
            .get_record(namespace, &version, fingerprint.as_str(), kind)
            .await
        {
            return Ok(Canonicalized {
                fingerprint,
                record,
                source: Source::Cache,
            });
        }

        let key = storage_key(namespace, &version, fingerprint.as_str());
        let inner = self.inner.clone();
        let (record, source) = self
            .inner
            .flights
            .run(&key, move || async move { inner.resolve(prepared, kind).await })
            .await;

        Ok(Canonicalized {
            fingerprint,
            record,
            source,
        })
    }
}

impl Inner {
    async fn resolve(
        &self,
        prepared: PreparedInput,
        kind: RecordKind,
    ) -> (CanonicalRecord, Source) {
        let namespace = Namespace::Record(kind);
        let version = self.versions.for_namespace(namespace);
        let fingerprint = prepared.fingerprint.as_str();

        // A flight that finished just before this one started may have
        // written the record already.
        if let Some(record) = self
            .cache
            .get_record(namespace, &version, fingerprint, kind)
            .await
        {
            return (record, Source::Cache);
        }

        let request = ModelRequest {
            mode: ModelMode::Canonicalize(kind),
            system: prompts::canonicalize_system(kind, &self.base_locale),
            prompt: prompts::canonicalize_prompt(kind, &prepared.payload),
            image_base64: match &prepared.payload {
                Payload::Image(data) => Some(data.clone()),
                Payload::Text(_) => None,
            },
        };

        let raw = match call_json(self.transport.as_ref(), request, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(%kind, fingerprint, error = %e, "canonicalization failed, using defaults");
                return (self.tag(normalize(None, kind)), Source::Fallback);
            }
        };

        let record = self.tag(normalize(Some(&raw), kind));
        match record.to_value() {
            Ok(value) => self.cache.set(namespace, &version, fingerprint, &value).await,
            Err(e) => tracing::warn!(%kind, fingerprint, error = %e, "record not serializable"),
        }
        tracing::info!(%kind, fingerprint, "canonical record stored");
        (record, Source::Model)
    }

    fn tag(&self, record: CanonicalRecord) -> CanonicalRecord {
        if record.locale() == self.base_locale {
            record
        } else {
            record.with_locale(&self.base_locale)
        }
    }
}
