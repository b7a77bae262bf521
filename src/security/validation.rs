//! Inbound generate request validation.
//!
//! # Responsibilities
//! - Enforce `Content-Type: application/json` exactly
//! - Require the body to be a JSON object
//! - Require a textual `prompt` made only of safe characters
//!
//! # Design Decisions
//! - Pure: returns a decision, never logs or touches the payload
//! - Whitelist, not blacklist: anything outside the safe set is rejected

use std::sync::LazyLock;

use axum::http::{header, HeaderMap};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ProxyError;

/// Letters, digits, whitespace and `. , ! ? ; : ( ) - < > ' " /`.
static SAFE_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[a-zA-Z0-9\s.,!?;:()\-<>'"/]+$"#).expect("safe prompt pattern compiles")
});

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request body that passed validation.
///
/// Holds the whole caller-supplied object; `prompt` is guaranteed present and
/// textual.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    fields: Map<String, Value>,
}

impl GenerationRequest {
    pub fn prompt(&self) -> &str {
        self.fields
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

/// Checks raw requests against the configured policy.
#[derive(Debug, Clone, Copy)]
pub struct RequestValidator {
    check_prompt_charset: bool,
}

impl RequestValidator {
    pub fn new(check_prompt_charset: bool) -> Self {
        Self {
            check_prompt_charset,
        }
    }

    /// Validate headers and body, in that order.
    pub fn validate(&self, headers: &HeaderMap, body: &[u8]) -> Result<GenerationRequest, ProxyError> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim);
        if content_type != Some(JSON_CONTENT_TYPE) {
            return Err(ProxyError::InvalidContentType);
        }

        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            _ => return Err(ProxyError::InvalidFormat),
        };

        match fields.get("prompt") {
            Some(Value::String(prompt)) if !self.check_prompt_charset || is_safe_prompt(prompt) => {}
            _ => return Err(ProxyError::InvalidPrompt),
        }

        Ok(GenerationRequest { fields })
    }
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(true)
    }
}

/// True when the prompt is non-empty and uses only safe characters.
pub fn is_safe_prompt(prompt: &str) -> bool {
    SAFE_PROMPT.is_match(prompt)
}
