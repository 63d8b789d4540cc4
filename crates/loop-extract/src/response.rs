//! Response envelope and inner fact JSON parsing.
//!
//! The service wraps the generated text in
//! `candidates[0].content.parts[0].text`. That text is itself JSON: either
//! `{"facts": [...]}` or a bare `[...]`.

use serde_json::Value;

use crate::errors::{ExtractError, Result};

/// JSON pointer to the generated text inside the envelope.
const TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

/// Pull the generated text out of a response envelope.
pub fn extract_text(envelope: &Value) -> Result<&str> {
    match envelope.pointer(TEXT_POINTER) {
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(_) => Err(ExtractError::malformed(
            "candidates[0].content.parts[0].text is not a string",
        )),
        None => {
            let reason = envelope
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .map(|r| format!(" (prompt blocked: {r})"))
                .unwrap_or_default();
            Err(ExtractError::malformed(format!(
                "missing candidates[0].content.parts[0].text{reason}"
            )))
        }
    }
}

/// Parse the generated text into the list of fact payloads.
///
/// Accepts `{"facts": [...]}`, a bare array, and either form wrapped in a
/// Markdown code fence. An object without `facts` yields no payloads.
pub fn parse_fact_payloads(text: &str) -> Result<Vec<Value>> {
    let parsed: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ExtractError::malformed(format!("generated text is not JSON: {e}")))?;

    match parsed {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("facts") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ExtractError::malformed("`facts` is not a list")),
        },
        _ => Err(ExtractError::malformed(
            "generated JSON is neither a list nor an object",
        )),
    }
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
