//! `GET /help`: static description of the API and its protections.

use serde_json::{json, Value};

use crate::config::ProxyConfig;

/// Build the help document. Pure function of the configuration.
pub fn help_document(config: &ProxyConfig) -> Value {
    let rate_limit = format!(
        "{} requests per {} seconds per IP.",
        config.rate_limit.requests_per_minute, config.rate_limit.window_secs
    );
    let prompt_validation = if config.security.prompt_validation {
        "Only allows alphanumeric characters, whitespace and basic punctuation (. , ! ? ; : ( ) - < > ' \" /)."
    } else {
        "Disabled; any text prompt is accepted."
    };
    let chunk_timeout = match config.upstream.chunk_timeout_secs {
        Some(secs) => format!("Streams stalling for more than {secs} seconds are closed."),
        None => "No limit between streamed chunks.".to_string(),
    };

    json!({
        "description": "Proxy forwarding generation requests to a local LLM server.",
        "model": config.upstream.model,
        "endpoints": {
            "/api/generate": {
                "method": "POST",
                "description": "Forwards a request to the local LLM server and streams the reply.",
                "request_format": {
                    "model": format!("Automatically set to the configured model ('{}').", config.upstream.model),
                    "prompt": "User input (validated for safe characters).",
                    "stream": "Always set to true."
                },
                "rate_limit": rate_limit,
                "content_type": "Only 'application/json' is allowed.",
                "response_format": "Streaming text response (text/plain; charset=utf-8)."
            },
            "/help": {
                "method": "GET",
                "description": "Displays this help information."
            }
        },
        "security": {
            "rate_limiting": rate_limit,
            "prompt_validation": prompt_validation,
            "content_type": "Rejects non-JSON requests.",
            "timeout": format!(
                "Requests to the LLM server have a {}-second timeout to first response.",
                config.upstream.timeout_secs
            ),
            "stream_timeout": chunk_timeout
        }
    })
}
