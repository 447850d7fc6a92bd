//! Engine facade: one call from raw input to a localized record.
//!
//! ```text
//! input ──▶ fingerprint ──▶ canonical cache ──miss──▶ model ──▶ normalize ──▶ store
//!                                 │
//!                                 ▼
//!                       canonical record ──▶ translation cache ──miss──▶ model ──▶ store
//!                                                   │
//!                                                   ▼
//!                                            localized record
//! ```
//!
//! Canonicalization and translation share one [`VersionedCache`] and one
//! transport, but are memoized independently: a new locale for a known
//! input costs one translation call and no canonicalization call.

use std::sync::Arc;

use anyhow::{Context, Result};

use care_cache_core::fingerprint::{fingerprint, Fingerprint, Input};
use care_cache_core::store::DurableStore;
use care_cache_core::{CanonicalRecord, RecordKind};

use crate::cache::{CacheStats, VersionedCache};
use crate::canonical::Canonicalizer;
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;
use crate::transport::{create_transport, ModelTransport};
use crate::translate::TranslationMemoizer;

/// Result of [`CareEngine::analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub fingerprint: Fingerprint,
    /// Base-locale record, as cached.
    pub canonical: CanonicalRecord,
    /// The record in the requested locale. Equal to `canonical` when the
    /// requested locale resolves to the base locale.
    pub localized: CanonicalRecord,
}

/// Wires the cache, the canonicalizer and the translation memoizer.
#[derive(Clone)]
pub struct CareEngine {
    config: Config,
    cache: Arc<VersionedCache>,
    canonicalizer: Canonicalizer,
    translator: TranslationMemoizer,
}

impl CareEngine {
    pub fn new(
        config: Config,
        durable: Arc<dyn DurableStore>,
        transport: Arc<dyn ModelTransport>,
    ) -> Self {
        let cache = Arc::new(VersionedCache::new(durable));
        let canonicalizer = Canonicalizer::new(&config, cache.clone(), transport.clone());
        let translator = TranslationMemoizer::new(&config, cache.clone(), transport);
        Self {
            config,
            cache,
            canonicalizer,
            translator,
        }
    }

    /// Build an engine backed by the configured SQLite database and model
    /// provider. Runs migrations first.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::run_migrations(&pool)
            .await
            .context("Failed to run cache migrations")?;
        let transport = create_transport(&config.model)?;
        Ok(Self::new(
            config.clone(),
            Arc::new(SqliteStore::new(pool)),
            transport,
        ))
    }

    /// Fingerprint, canonicalize and localize `input`.
    ///
    /// Fails only on invalid input; every other problem degrades to a
    /// default or untranslated record. Fallback defaults are never sent for
    /// translation.
    pub async fn analyze(
        &self,
        input: &Input,
        kind: RecordKind,
        locale: &str,
    ) -> care_cache_core::Result<Analysis> {
        let canonicalized = self.canonicalizer.canonicalize(input, kind).await?;
        let localized = if canonicalized.is_fallback() {
            self.translator.untranslated(&canonicalized.record, locale)
        } else {
            self.translator
                .localize(&canonicalized.record, &canonicalized.fingerprint, locale)
                .await
        };
        Ok(Analysis {
            fingerprint: canonicalized.fingerprint,
            canonical: canonicalized.record,
            localized,
        })
    }

    /// Fingerprint `input` without touching the cache or the model.
    pub fn fingerprint(&self, input: &Input) -> care_cache_core::Result<Fingerprint> {
        fingerprint(input, self.config.cache.min_image_payload)
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    pub fn translator(&self) -> &TranslationMemoizer {
        &self.translator
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
