//! Extraction of the JSON object from a free-form model reply.
//!
//! Models asked for JSON still wrap it in markdown fences or add a sentence
//! before it. [`extract_json`] tries, in order: the whole reply with fences
//! stripped, then the span from the first `{` to the last `}`.

use serde_json::Value;

use crate::error::{CareError, Result};

/// Parse the JSON object contained in a model reply.
///
/// Fails with [`CareError::ParseFailure`] when no JSON object can be found.
pub fn extract_json(reply: &str) -> Result<Value> {
    let body = strip_fences(reply.trim());

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return expect_object(value);
    }

    let start = body.find('{');
    let end = body.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str::<Value>(&body[start..=end])
            .map_err(|e| CareError::ParseFailure(e.to_string()))
            .and_then(expect_object),
        _ => Err(CareError::ParseFailure(
            "reply contains no JSON object".to_string(),
        )),
    }
}

fn expect_object(value: Value) -> Result<Value> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(CareError::ParseFailure(format!(
            "expected a JSON object, got {}",
            json_type(&value)
        )))
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
