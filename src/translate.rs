//! Translation memoizer.
//!
//! Translates a canonical record into a target locale at most once per
//! `(fingerprint, locale)` and cache version. The base locale is never sent
//! to the model.
//!
//! | Namespace | Version | Key | Value |
//! |-----------|---------|-----|-------|
//! | `translation.<kind>` | `translation:<kind>` | `fingerprint:locale` | translated record |
//! | `translation.label` | `translation` | `sha256(label):locale` | translated label string |
//!
//! A translated record carries the version of the canonical record it was
//! made from, so a new canonical version never meets an old translation.
//!
//! Batch group labels and suggestions are drawn from a small set of
//! recurring strings, so they go through the label cache one by one and are
//! shared across every batch record that contains them. A batch record with
//! any label left untranslated is returned but not cached.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;

use care_cache_core::fingerprint::{hash_label, Fingerprint};
use care_cache_core::locale::LocalePolicy;
use care_cache_core::models::BatchResult;
use care_cache_core::store::{storage_key, Namespace};
use care_cache_core::translate::merge_translation;
use care_cache_core::CanonicalRecord;

use crate::cache::VersionedCache;
use crate::config::{CacheVersions, Config};
use crate::prompts;
use crate::single_flight::SingleFlight;
use crate::transport::{call_json, ModelMode, ModelRequest, ModelTransport};

/// Memoized per-locale translations of canonical records.
#[derive(Clone)]
pub struct TranslationMemoizer {
    inner: Arc<Inner>,
}

struct Inner {
    cache: Arc<VersionedCache>,
    transport: Arc<dyn ModelTransport>,
    versions: CacheVersions,
    policy: LocalePolicy,
    timeout: Duration,
    records: SingleFlight<CanonicalRecord>,
    labels: SingleFlight<Option<String>>,
}

impl TranslationMemoizer {
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
                policy: config.cache.locale_policy(),
                timeout: config.model.timeout(),
                records: SingleFlight::new(),
                labels: SingleFlight::new(),
            }),
        }
    }

    pub fn policy(&self) -> &LocalePolicy {
        &self.inner.policy
    }

    /// `canonical` tagged with the resolved `locale`, prose left as is.
    pub fn untranslated(&self, canonical: &CanonicalRecord, locale: &str) -> CanonicalRecord {
        let locale = self.inner.policy.resolve(locale);
        merge_translation(canonical, None, &locale)
    }

    /// Return `canonical` translated into `locale`.
    ///
    /// Unsupported locales resolve to the base locale. If the model cannot
    /// produce a translation, the canonical prose is returned tagged with
    /// the target locale and nothing is cached.
    pub async fn localize(
        &self,
        canonical: &CanonicalRecord,
        fingerprint: &Fingerprint,
        locale: &str,
    ) -> CanonicalRecord {
        let locale = self.inner.policy.resolve(locale);
        if self.inner.policy.is_base(&locale) {
            return canonical.clone().with_locale(self.inner.policy.base());
        }

        let kind = canonical.kind();
        let namespace = Namespace::Translation(kind);
        let version = self.inner.versions.for_namespace(namespace);
        let key = format!("{}:{}", fingerprint, locale);
        if let Some(record) = self
            .inner
            .cache
            .get_record(namespace, &version, &key, kind)
            .await
        {
            return record;
        }

        let flight_key = storage_key(namespace, &version, &key);
        let inner = self.inner.clone();
        let canonical = canonical.clone();
        self.inner
            .records
            .run(&flight_key, move || async move {
                inner.translate_record(canonical, key, locale).await
            })
            .await
    }

    /// Return `label` translated into `locale`, memoized by label hash.
    pub async fn localize_label(&self, label: &str, locale: &str) -> String {
        let locale = self.inner.policy.resolve(locale);
        Inner::localize_label(&self.inner, label.to_string(), locale)
            .await
            .unwrap_or_else(|| label.to_string())
    }
}

impl Inner {
    async fn translate_record(
        self: Arc<Self>,
        canonical: CanonicalRecord,
        key: String,
        locale: String,
    ) -> CanonicalRecord {
        let kind = canonical.kind();
        let namespace = Namespace::Translation(kind);
        let version = self.versions.for_namespace(namespace);

        if let Some(record) = self.cache.get_record(namespace, &version, &key, kind).await {
            return record;
        }

        let serialized = match serde_json::to_string(&canonical) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!(%kind, key = %key, error = %e, "record not serializable, skipping translation");
                return merge_translation(&canonical, None, &locale);
            }
        };
        let request = ModelRequest {
            mode: ModelMode::Translate {
                kind,
                locale: locale.clone(),
            },
            system: prompts::translate_system(&locale),
            prompt: prompts::translate_prompt(&serialized),
            image_base64: None,
        };

        let translated = match call_json(self.transport.as_ref(), request, self.timeout).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(%kind, key = %key, error = %e, "translation failed, keeping canonical text");
                return merge_translation(&canonical, None, &locale);
            }
        };

        let mut record = merge_translation(&canonical, Some(&translated), &locale);
        if let CanonicalRecord::Batch(batch) = &mut record {
            if !self.clone().localize_batch_labels(batch, &locale).await {
                tracing::warn!(%kind, key = %key, "batch labels incomplete, translation not stored");
                return record;
            }
        }

        match record.to_value() {
            Ok(value) => self.cache.set(namespace, &version, &key, &value).await,
            Err(e) => tracing::warn!(%kind, key = %key, error = %e, "translated record not serializable"),
        }
        tracing::info!(%kind, key = %key, "translation stored");
        record
    }

    /// Translate group labels and suggestions in place. Returns `false` if
    /// any of them kept its base-locale text.
    async fn localize_batch_labels(self: Arc<Self>, batch: &mut BatchResult, locale: &str) -> bool {
        let mut complete = true;

        let groups = join_all(
            batch
                .groups
                .iter()
                .map(|g| Inner::localize_label(&self, g.label.clone(), locale.to_string())),
        )
        .await;
        for (group, label) in batch.groups.iter_mut().zip(groups) {
            match label {
                Some(label) => group.label = label,
                None => complete = false,
            }
        }

        let suggestions = join_all(
            batch
                .suggestions
                .iter()
                .map(|s| Inner::localize_label(&self, s.clone(), locale.to_string())),
        )
        .await;
        for (suggestion, text) in batch.suggestions.iter_mut().zip(suggestions) {
            match text {
                Some(text) => *suggestion = text,
                None => complete = false,
            }
        }

        complete
    }

    /// `None` when the label needed translating and the model failed.
    async fn localize_label(this: &Arc<Self>, label: String, locale: String) -> Option<String> {
        if this.policy.is_base(&locale) || label.trim().is_empty() {
            return Some(label);
        }

        let namespace = Namespace::Label;
        let version = this.versions.for_namespace(namespace);
        let key = format!("{}:{}", hash_label(&label), locale);
        if let Some(text) = cached_label(&this.cache, &version, &key).await {
            return Some(text);
        }

        let flight_key = storage_key(namespace, &version, &key);
        let inner = this.clone();
        this.labels
            .run(&flight_key, move || async move {
                inner.translate_label(label, key, locale).await
            })
            .await
    }

    async fn translate_label(
        self: Arc<Self>,
        label: String,
        key: String,
        locale: String,
    ) -> Option<String> {
        let version = self.versions.for_namespace(Namespace::Label);
        if let Some(text) = cached_label(&self.cache, &version, &key).await {
            return Some(text);
        }

        let request = ModelRequest {
            mode: ModelMode::TranslateLabel {
                locale: locale.clone(),
            },
            system: prompts::label_system(&locale),
            prompt: prompts::label_prompt(&label),
            image_base64: None,
        };

        let text = match call_json(self.transport.as_ref(), request, self.timeout).await {
            Ok(reply) => reply
                .get("text")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "label translation failed");
                None
            }
        };

        let text = text?;
        self.cache
            .set(Namespace::Label, &version, &key, &Value::String(text.clone()))
            .await;
        Some(text)
    }
}

async fn cached_label(cache: &VersionedCache, version: &str, key: &str) -> Option<String> {
    match cache.get(Namespace::Label, version, key).await? {
        Value::String(text) => Some(text),
        _ => None,
    }
}
