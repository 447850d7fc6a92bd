//! Scripted model transport shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use care_cache::config::Config;
use care_cache::transport::{ModelMode, ModelRequest, ModelTransport};
use care_cache::CareEngine;
use care_cache_core::store::memory::InMemoryStore;
use care_cache_core::Input;

/// Transport that answers from fixed replies and counts calls per mode.
///
/// - Canonicalize: `canonical` verbatim.
/// - Translate: `translation` verbatim, or an error when `None`.
/// - TranslateLabel: `{"text": "<locale>|<label>"}`.
///
/// The first `canonical_failures` canonicalize calls and the first
/// `label_failures` label calls return an error instead.
pub struct ScriptedTransport {
    pub canonical: String,
    pub translation: Option<String>,
    pub delay: Duration,
    pub canonical_failures: AtomicUsize,
    pub label_failures: AtomicUsize,
    pub canonical_calls: AtomicUsize,
    pub translate_calls: AtomicUsize,
    pub label_calls: AtomicUsize,
    pub completed: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(canonical: &str) -> Self {
        Self {
            canonical: canonical.to_string(),
            translation: None,
            delay: Duration::ZERO,
            canonical_failures: AtomicUsize::new(0),
            label_failures: AtomicUsize::new(0),
            canonical_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
            label_calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn with_translation(mut self, translation: &str) -> Self {
        self.translation = Some(translation.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_canonical(self, calls: usize) -> Self {
        self.canonical_failures.store(calls, Ordering::SeqCst);
        self
    }

    pub fn failing_labels(self, calls: usize) -> Self {
        self.label_failures.store(calls, Ordering::SeqCst);
        self
    }

    pub fn canonical_calls(&self) -> usize {
        self.canonical_calls.load(Ordering::SeqCst)
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn label_calls(&self) -> usize {
        self.label_calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn call(&self, request: ModelRequest) -> Result<String> {
        let reply = match &request.mode {
            ModelMode::Canonicalize(_) => {
                self.canonical_calls.fetch_add(1, Ordering::SeqCst);
                if take_failure(&self.canonical_failures) {
                    Err(anyhow::anyhow!("model unavailable"))
                } else {
                    Ok(self.canonical.clone())
                }
            }
            ModelMode::Translate { .. } => {
                self.translate_calls.fetch_add(1, Ordering::SeqCst);
                self.translation
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("translation unavailable"))
            }
            ModelMode::TranslateLabel { locale } => {
                self.label_calls.fetch_add(1, Ordering::SeqCst);
                if take_failure(&self.label_failures) {
                    Err(anyhow::anyhow!("label translation unavailable"))
                } else {
                    let label = request.prompt.trim_start_matches("Label: ");
                    Ok(serde_json::json!({ "text": format!("{}|{}", locale, label) }).to_string())
                }
            }
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        reply
    }
}

/// Consume one pending failure, if any are left.
fn take_failure(remaining: &AtomicUsize) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

pub fn engine_with(
    config: Config,
    store: Arc<InMemoryStore>,
    transport: Arc<ScriptedTransport>,
) -> CareEngine {
    CareEngine::new(config, store, transport)
}

pub fn text(query: &str) -> Input {
    Input::Text(query.to_string())
}

/// A base64 payload long enough to pass the minimum size check.
pub fn image(seed: u8) -> Input {
    Input::ImageBytes((0..200u16).map(|i| (i as u8).wrapping_mul(seed)).collect())
}
