//! Configuration management for termpilot.
//!
//! Configuration is read from environment variables (a `.env` file in the
//! working directory is loaded first by the binary):
//! - `AZURE_ENDPOINT` - Required. Base URL of the chat-completions backend.
//! - `AZURE_API_KEY` - Required. API key for the backend.
//! - `AZURE_DEPLOYMENT_NAME` - Required. Deployment (model) name.
//! - `AZURE_API_VERSION` - Optional. When set, requests use the Azure OpenAI
//!   deployment URL layout; otherwise the endpoint is treated as an
//!   OpenAI-compatible base URL.
//! - `MAX_ITERATIONS` - Optional. Tool-bearing rounds per turn. Defaults to `10`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Deadline for one model call. Defaults to `120`.
//! - `SHELL_TIMEOUT_SECS` - Optional. Deadline for one shell command. Defaults to `60`.
//! - `LOG_FILE` - Optional. Structured log destination. Defaults to `app.log`.
//! - `WORKSPACE_PATH` - Optional. Directory tools resolve relative paths against.
//!   Defaults to the current directory.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Connection settings for the model backend.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,

    /// API key sent with every request
    pub api_key: String,

    /// Azure API version; `None` selects the plain OpenAI URL layout
    pub api_version: Option<String>,

    /// Deployment / model identifier
    pub model: String,
}

impl GatewayConfig {
    /// Full URL of the chat-completions route for this backend.
    pub fn chat_completions_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match &self.api_version {
            Some(version) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base, self.model, version
            ),
            None => format!("{}/chat/completions", base),
        }
    }

    /// API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model backend settings
    pub gateway: GatewayConfig,

    /// Workspace directory for file operations
    pub workspace_path: PathBuf,

    /// Maximum tool-bearing rounds per turn
    pub max_iterations: usize,

    /// Deadline for a single model call
    pub request_timeout: Duration,

    /// Deadline for a single shell command
    pub shell_timeout: Duration,

    /// Structured log file
    pub log_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if one of the backend variables is
    /// not set, and `ConfigError::InvalidValue` if a numeric setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = required_var("AZURE_ENDPOINT")?;
        let api_key = required_var("AZURE_API_KEY")?;
        let model = required_var("AZURE_DEPLOYMENT_NAME")?;
        let api_version = std::env::var("AZURE_API_VERSION")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let workspace_path = std::env::var("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_iterations = parse_var("MAX_ITERATIONS", 10usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let request_timeout = Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 120u64)?);
        let shell_timeout = Duration::from_secs(parse_var("SHELL_TIMEOUT_SECS", 60u64)?);

        let log_file = std::env::var("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("app.log"));

        Ok(Self {
            gateway: GatewayConfig {
                endpoint,
                api_key,
                api_version,
                model,
            },
            workspace_path,
            max_iterations,
            request_timeout,
            shell_timeout,
            log_file,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(gateway: GatewayConfig, workspace_path: PathBuf) -> Self {
        Self {
            gateway,
            workspace_path,
            max_iterations: 10,
            request_timeout: Duration::from_secs(120),
            shell_timeout: Duration::from_secs(60),
            log_file: PathBuf::from("app.log"),
        }
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(api_version: Option<&str>) -> GatewayConfig {
        GatewayConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "sk-test-abcdef1234".to_string(),
            api_version: api_version.map(str::to_string),
            model: "gpt-4.1-mini".to_string(),
        }
    }

    #[test]
    fn azure_url_uses_deployment_layout() {
        let url = gateway(Some("2024-10-21")).chat_completions_url();
        assert_eq!(
            url,
            "https://example.openai.azure.com/openai/deployments/gpt-4.1-mini/chat/completions?api-version=2024-10-21"
        );
    }

    #[test]
    fn plain_url_without_api_version() {
        let url = gateway(None).chat_completions_url();
        assert_eq!(url, "https://example.openai.azure.com/chat/completions");
    }

    #[test]
    fn api_key_is_masked() {
        let masked = gateway(None).masked_api_key();
        assert!(masked.ends_with("1234"));
        assert!(!masked.contains("sk-test"));

        let mut short = gateway(None);
        short.api_key = "abc".to_string();
        assert_eq!(short.masked_api_key(), "***");
    }

    #[test]
    fn new_uses_defaults() {
        let config = Config::new(gateway(None), PathBuf::from("/tmp"));
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.shell_timeout, Duration::from_secs(60));
        assert_eq!(config.log_file, PathBuf::from("app.log"));
    }
}
