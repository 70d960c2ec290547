//! Client Configuration
//!
//! Loads the endpoint URLs, secrets and prompt settings for ragchat from a
//! TOML file at `~/.config/ragchat/config.toml`.
//!
//! # Configuration Priority
//!
//! Values are applied with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! Two secrets are required before any chat request can be made: the
//! RunPod endpoint identifier (or an explicit chat URL) and the bearer
//! credential. [`ClientConfig::validate`] fails fast when either is missing.
//!
//! # Example Configuration
//!
//! ```toml
//! [secrets]
//! runpod_id = "abc123xyz"
//! runpod_api_key = "rp_0123456789"
//!
//! [endpoints]
//! upload_base_url = "http://localhost:8000"
//! docs_base_url = "http://127.0.0.1:8000"
//!
//! [http]
//! request_timeout_secs = 300
//! connect_timeout_secs = 10
//!
//! [prompt]
//! system_preamble = "You are a concise assistant."
//! rules_heading = "Follow these rules:"
//! formatting_rules = ["Answer briefly."]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::PromptTemplate;

/// Environment variable holding the RunPod endpoint identifier
pub const ENV_API_ID: &str = "RUNPOD_ID";
/// Environment variable holding the bearer credential
pub const ENV_API_KEY: &str = "RUNPOD_API_KEY";
/// Environment variable overriding the chat base URL
pub const ENV_CHAT_URL: &str = "RAGCHAT_CHAT_URL";
/// Environment variable overriding the upload base URL
pub const ENV_UPLOAD_URL: &str = "RAGCHAT_UPLOAD_URL";
/// Environment variable overriding the docs base URL
pub const ENV_DOCS_URL: &str = "RAGCHAT_DOCS_URL";
/// Environment variable overriding the request timeout (seconds)
pub const ENV_TIMEOUT_SECS: &str = "RAGCHAT_TIMEOUT_SECS";
/// Environment variable pointing at an alternative config file
pub const ENV_CONFIG_PATH: &str = "RAGCHAT_CONFIG";

const DEFAULT_UPLOAD_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_DOCS_BASE_URL: &str = "http://127.0.0.1:8000";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A required secret is absent from every source
    #[error("Missing required secret {name} (set it in the config file or via ${env})")]
    MissingSecret {
        /// Config-file key of the secret
        name: &'static str,
        /// Environment variable that can provide it
        env: &'static str,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Secrets section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsToml {
    /// RunPod endpoint identifier
    pub runpod_id: Option<String>,
    /// Bearer credential for the chat endpoint
    pub runpod_api_key: Option<String>,
}

/// Endpoints section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsToml {
    /// Explicit chat base URL (replaces the RunPod-derived one)
    pub chat_base_url: Option<String>,
    /// Ingestion service base URL
    pub upload_base_url: Option<String>,
    /// Docs service base URL used for source links
    pub docs_base_url: Option<String>,
}

/// HTTP section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpToml {
    /// Whole-request timeout in seconds (0 = none)
    pub request_timeout_secs: Option<u64>,
    /// Connect timeout in seconds
    pub connect_timeout_secs: Option<u64>,
}

/// Prompt section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptToml {
    /// System instruction
    pub system_preamble: Option<String>,
    /// Heading above the formatting rules
    pub rules_heading: Option<String>,
    /// Formatting rules, one per bullet
    pub formatting_rules: Option<Vec<String>>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagchatToml {
    /// Secrets section
    pub secrets: SecretsToml,
    /// Endpoints section
    pub endpoints: EndpointsToml,
    /// HTTP section
    pub http: HttpToml,
    /// Prompt section
    pub prompt: PromptToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration for the chat and upload clients
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// RunPod endpoint identifier
    pub api_id: Option<String>,
    /// Bearer credential for the chat endpoint
    pub api_key: Option<String>,
    /// Explicit chat base URL, overriding the one derived from `api_id`
    pub chat_base_url: Option<String>,
    /// Ingestion service base URL
    pub upload_base_url: String,
    /// Docs service base URL used for source links
    pub docs_base_url: String,
    /// Whole-request timeout (`None` = wait for the stream indefinitely)
    pub request_timeout: Option<Duration>,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Prompt template for chat requests
    pub prompt: PromptTemplate,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_id: None,
            api_key: None,
            chat_base_url: None,
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            docs_base_url: DEFAULT_DOCS_BASE_URL.to_string(),
            request_timeout: Some(Duration::from_secs(300)),
            connect_timeout: Duration::from_secs(10),
            prompt: PromptTemplate::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Chat base URL: the explicit override, else `https://{api_id}.api.runpod.ai`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when neither is configured.
    pub fn chat_base_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.chat_base_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        Ok(format!("https://{}.api.runpod.ai", self.api_id()?))
    }

    /// The RunPod endpoint identifier
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when no identifier is configured.
    pub fn api_id(&self) -> Result<&str, ConfigError> {
        match self.api_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ConfigError::MissingSecret {
                name: "runpod_id",
                env: ENV_API_ID,
            }),
        }
    }

    /// The bearer credential
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when no credential is configured.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingSecret {
                name: "runpod_api_key",
                env: ENV_API_KEY,
            }),
        }
    }

    /// Check that both secrets are present and the URLs are usable
    ///
    /// Both secrets are required even when an explicit chat URL is set.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_id()?;
        self.api_key()?;
        let chat = self.chat_base_url()?;

        for (name, url) in [
            ("chat_base_url", chat.as_str()),
            ("upload_base_url", self.upload_base_url.as_str()),
            ("docs_base_url", self.docs_base_url.as_str()),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority)
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.chat_url {
            self.chat_base_url = Some(url.clone());
            self.source = ConfigSource::Cli;
        }
        if let Some(url) = &overrides.upload_url {
            self.upload_base_url = url.clone();
            self.source = ConfigSource::Cli;
        }
        if let Some(url) = &overrides.docs_url {
            self.docs_base_url = url.clone();
            self.source = ConfigSource::Cli;
        }
    }
}

/// Values supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Config file path
    pub config_path: Option<PathBuf>,
    /// Chat base URL
    pub chat_url: Option<String>,
    /// Upload base URL
    pub upload_url: Option<String>,
    /// Docs base URL
    pub docs_url: Option<String>,
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/ragchat/config.toml` or
/// `~/.config/ragchat/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ragchat").join("config.toml"))
}

/// Load configuration from every source and validate it
///
/// The file comes from `overrides.config_path`, then `$RAGCHAT_CONFIG`, then
/// [`default_config_path`].
///
/// # Errors
///
/// Returns an error if the config file cannot be parsed or a required secret
/// is missing.
pub fn load_config(overrides: &ConfigOverrides) -> Result<ClientConfig, ConfigError> {
    let path = overrides
        .config_path
        .clone()
        .or_else(|| std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from))
        .or_else(default_config_path);

    let mut config = load_config_from_path(path, |key| std::env::var(key).ok())?;
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific path and environment lookup
///
/// A missing file is not an error (defaults are used). No validation is
/// performed here.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from_path<F>(path: Option<PathBuf>, env: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RagchatToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env)?;
    Ok(config)
}

fn apply_toml_config(config: &mut ClientConfig, toml: RagchatToml) {
    if toml.secrets.runpod_id.is_some() {
        config.api_id = toml.secrets.runpod_id;
    }
    if toml.secrets.runpod_api_key.is_some() {
        config.api_key = toml.secrets.runpod_api_key;
    }

    if toml.endpoints.chat_base_url.is_some() {
        config.chat_base_url = toml.endpoints.chat_base_url;
    }
    if let Some(url) = toml.endpoints.upload_base_url {
        config.upload_base_url = url;
    }
    if let Some(url) = toml.endpoints.docs_base_url {
        config.docs_base_url = url;
    }

    if let Some(secs) = toml.http.request_timeout_secs {
        config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(secs) = toml.http.connect_timeout_secs {
        config.connect_timeout = Duration::from_secs(secs);
    }

    if let Some(preamble) = toml.prompt.system_preamble {
        config.prompt.system_preamble = preamble;
    }
    if let Some(heading) = toml.prompt.rules_heading {
        config.prompt.rules_heading = heading;
    }
    if let Some(rules) = toml.prompt.formatting_rules {
        config.prompt.formatting_rules = rules;
    }
}

fn apply_env_config<F>(config: &mut ClientConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(id) = env(ENV_API_ID) {
        config.api_id = Some(id);
        config.source = ConfigSource::Env;
    }
    if let Some(key) = env(ENV_API_KEY) {
        config.api_key = Some(key);
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env(ENV_CHAT_URL) {
        config.chat_base_url = Some(url);
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env(ENV_UPLOAD_URL) {
        config.upload_base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env(ENV_DOCS_URL) {
        config.docs_base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env(ENV_TIMEOUT_SECS) {
        let secs: u64 = timeout.trim().parse().map_err(|_| {
            ConfigError::ValidationError(format!("{ENV_TIMEOUT_SECS} must be seconds, got {timeout:?}"))
        })?;
        config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        config.source = ConfigSource::Env;
    }
    Ok(())
}
