//! Command-line interface.
//!
//! Positional arguments keep the familiar `llm-proxy [URL] [MODEL] [RATE_LIMIT]`
//! shape; a TOML file can supply everything else.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{read_config, validate_config, ConfigError, ProxyConfig};

const AFTER_HELP: &str = "\
Endpoints:
    POST /api/generate  Forwards prompt requests to the LLM server and streams the reply.
    GET  /help          Displays API usage and security information.

Security measures:
    - Rate limiting (default: 5 requests per minute per IP)
    - Only accepts application/json requests
    - Prompt validation against a safe character set
    - Timeout to first response from the LLM server (default: 10 seconds)

Example:
    llm-proxy http://localhost:12345/api/generate my_custom_model 10";

#[derive(Debug, Parser)]
#[command(name = "llm-proxy", version)]
#[command(about = "Proxy that lets browser pages use a local LLM server safely", long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// URL of the LLM server's generate endpoint [default: http://localhost:11434/api/generate]
    pub upstream_url: Option<String>,

    /// Model name forced onto every request [default: llama3.1]
    pub model: Option<String>,

    /// Maximum requests per minute per client IP [default: 5]
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: Option<u32>,

    /// TOML configuration file; positional arguments override it
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Listen address [default: 0.0.0.0:5000]
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

impl Cli {
    /// Resolve the final configuration: defaults, then file, then arguments.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(url) = self.upstream_url {
            config.upstream.url = url;
        }
        if let Some(model) = self.model {
            config.upstream.model = model;
        }
        if let Some(limit) = self.rate_limit {
            config.rate_limit.requests_per_minute = limit;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn no_arguments_gives_defaults() {
        let config = Cli::try_parse_from(["llm-proxy"]).unwrap().into_config().unwrap();
        assert_eq!(config.upstream.url, "http://localhost:11434/api/generate");
        assert_eq!(config.upstream.model, "llama3.1");
        assert_eq!(config.rate_limit.requests_per_minute, 5);
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
    }

    #[test]
    fn positionals_override_defaults() {
        let config = Cli::try_parse_from([
            "llm-proxy",
            "http://localhost:12345/api/generate",
            "my_custom_model",
            "10",
            "--bind",
            "127.0.0.1:8080",
        ])
        .unwrap()
        .into_config()
        .unwrap();

        assert_eq!(config.upstream.url, "http://localhost:12345/api/generate");
        assert_eq!(config.upstream.model, "my_custom_model");
        assert_eq!(config.rate_limit.requests_per_minute, 10);
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn rate_limit_must_be_positive_integer() {
        for bad in ["0", "-3", "five", "1.5"] {
            let err = Cli::try_parse_from(["llm-proxy", "http://h/api", "m", bad]).unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::ValueValidation | ErrorKind::InvalidValue | ErrorKind::UnknownArgument),
                "unexpected error kind for {bad:?}: {:?}",
                err.kind()
            );
        }
    }

    #[test]
    fn invalid_url_fails_validation() {
        let err = Cli::try_parse_from(["llm-proxy", "not a url"])
            .unwrap()
            .into_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn help_mentions_endpoints() {
        let err = Cli::try_parse_from(["llm-proxy", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let text = err.to_string();
        assert!(text.contains("/api/generate"));
        assert!(text.contains("/help"));
    }
}
