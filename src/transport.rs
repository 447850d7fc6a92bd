//! Model transport abstraction and implementations.
//!
//! Defines the [`ModelTransport`] trait and concrete implementations:
//! - **[`DisabledTransport`]**: always errors; every lookup that misses the
//!   cache then yields a default record.
//! - **[`OpenAiTransport`]**: calls an OpenAI-compatible chat completions
//!   endpoint in JSON mode.
//!
//! Transports return the raw reply text. Parsing, normalization and
//! timeouts are handled by the callers, so a transport never retries.
//!
//! # Transport Selection
//!
//! ```rust
//! # use care_cache::config::ModelConfig;
//! # use care_cache::transport::create_transport;
//! let config = ModelConfig::default(); // provider = "disabled"
//! let transport = create_transport(&config).unwrap();
//! assert_eq!(transport.name(), "disabled");
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use care_cache_core::models::RecordKind;
use care_cache_core::response::extract_json;
use care_cache_core::CareError;

use crate::config::ModelConfig;

/// What a model request is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelMode {
    /// Produce a canonical record of this kind from an image or query.
    Canonicalize(RecordKind),
    /// Translate a serialized record into `locale`.
    Translate { kind: RecordKind, locale: String },
    /// Translate a single short label into `locale`.
    TranslateLabel { locale: String },
}

/// One request to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub mode: ModelMode,
    pub system: String,
    pub prompt: String,
    /// Cleaned base64 image data, without a `data:` prefix.
    pub image_base64: Option<String>,
}

/// Remote vision/language model.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Send a request and return the reply text.
    async fn call(&self, request: ModelRequest) -> Result<String>;
}

// ============ Disabled Transport ============

/// A transport that refuses every request.
///
/// Used when `model.provider = "disabled"`. Cached records are still
/// served; misses resolve to default records.
pub struct DisabledTransport;

#[async_trait]
impl ModelTransport for DisabledTransport {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn call(&self, _request: ModelRequest) -> Result<String> {
        bail!("Model transport is disabled")
    }
}

// ============ OpenAI Transport ============

/// Transport using an OpenAI-compatible chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable. Images are sent
/// inline as `data:image/jpeg;base64,` URLs next to the text prompt.
pub struct OpenAiTransport {
    client: reqwest::Client,
    model: String,
    endpoint: String,
    api_key: String,
}

impl OpenAiTransport {
    /// Create a new OpenAI transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is not set in config, if
    /// `OPENAI_API_KEY` is not in the environment, or if the HTTP client
    /// cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("model.model required for OpenAI provider"))?;

        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            model,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ModelTransport for OpenAiTransport {
    fn name(&self) -> &str {
        &self.model
    }

    async fn call(&self, request: ModelRequest) -> Result<String> {
        let body = chat_body(&self.model, &request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Model API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Build the chat completions request body.
fn chat_body(model: &str, request: &ModelRequest) -> serde_json::Value {
    let user_content = match &request.image_base64 {
        Some(image) => serde_json::json!([
            { "type": "text", "text": request.prompt },
            {
                "type": "image_url",
                "image_url": { "url": format!("data:image/jpeg;base64,{}", image) }
            }
        ]),
        None => serde_json::Value::String(request.prompt.clone()),
    };

    serde_json::json!({
        "model": model,
        "temperature": 0,
        "response_format": { "type": "json_object" },
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": user_content }
        ]
    })
}

/// Extract `choices[0].message.content` from a chat completions reply.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid model response: missing choices[0].message.content"))
}

/// Call the model within `timeout` and parse the reply as a JSON object.
///
/// Errors, timeouts and unparsable replies come back as
/// [`CareError::TransportFailure`] or [`CareError::ParseFailure`] for the
/// caller to log and absorb.
pub async fn call_json(
    transport: &dyn ModelTransport,
    request: ModelRequest,
    timeout: Duration,
) -> std::result::Result<serde_json::Value, CareError> {
    let mode = format!("{:?}", request.mode);
    tracing::info!(transport = transport.name(), mode = %mode, "calling model");

    let reply = match tokio::time::timeout(timeout, transport.call(request)).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => return Err(CareError::TransportFailure(format!("{:#}", e))),
        Err(_) => {
            return Err(CareError::TransportFailure(format!(
                "timed out after {}s",
                timeout.as_secs_f32()
            )))
        }
    };
    extract_json(&reply)
}

/// Create the appropriate [`ModelTransport`] based on configuration.
///
/// | Config Value | Transport |
/// |-------------|-----------|
/// | `"disabled"` | [`DisabledTransport`] |
/// | `"openai"` | [`OpenAiTransport`] |
pub fn create_transport(config: &ModelConfig) -> Result<Arc<dyn ModelTransport>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledTransport)),
        "openai" => Ok(Arc::new(OpenAiTransport::new(config)?)),
        other => bail!("Unknown model provider: {}", other),
    }
}
