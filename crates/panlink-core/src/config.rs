//! panlink Configuration Management
//!
//! Settings come from a TOML file, environment variables and CLI flags,
//! applied in that order. Every field has a default suitable for a local run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one panlink invocation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction heuristics
    pub extraction: ExtractionConfig,

    /// Named-entity tagger configuration
    pub tagger: TaggerConfig,

    /// Result store configuration
    pub output: OutputConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Defaults overlaid with any `PANLINK_*`, `NER_*` and `LOG_LEVEL` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Output
        if let Ok(dir) = std::env::var("PANLINK_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(dir);
        }
        if let Ok(format) = std::env::var("PANLINK_OUTPUT_FORMAT") {
            config.output.format = format.parse()?;
        }

        // Tagger
        if let Ok(enabled) = std::env::var("NER_ENABLED") {
            config.tagger.enabled = parse_bool("NER_ENABLED", &enabled)?;
        }
        if let Ok(url) = std::env::var("NER_ENDPOINT") {
            config.tagger.endpoint = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Ok(token) = std::env::var("NER_API_TOKEN") {
            config.tagger.api_token = Some(token);
        }
        if let Ok(model) = std::env::var("NER_MODEL") {
            config.tagger.model = model;
        }
        if let Ok(secs) = std::env::var("NER_TIMEOUT_SECS") {
            config.tagger.timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "NER_TIMEOUT_SECS".to_string(),
                value: secs,
            })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Read a TOML file; missing sections keep their defaults
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Apply environment variables on top of file settings
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // A variable counts as set when it moves a value off its default
        if env_config.output.dir != defaults.output.dir {
            self.output.dir = env_config.output.dir;
        }
        if env_config.output.format != defaults.output.format {
            self.output.format = env_config.output.format;
        }
        if env_config.tagger.enabled != defaults.tagger.enabled {
            self.tagger.enabled = env_config.tagger.enabled;
        }
        if env_config.tagger.endpoint.is_some() {
            self.tagger.endpoint = env_config.tagger.endpoint;
        }
        if env_config.tagger.model != defaults.tagger.model {
            self.tagger.model = env_config.tagger.model;
        }
        if env_config.tagger.timeout_secs != defaults.tagger.timeout_secs {
            self.tagger.timeout_secs = env_config.tagger.timeout_secs;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        // An API token from the environment always wins
        if env_config.tagger.api_token.is_some() {
            self.tagger.api_token = env_config.tagger.api_token;
        }

        Ok(self)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Extraction heuristics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Characters captured on each side of an identifier match
    pub context_radius: usize,

    /// Maximum tagger persons linked when proximity linking finds nothing
    pub fallback_limit: usize,

    /// Characters per tagger chunk
    pub chunk_size: usize,

    /// Chunks shorter than this (after trimming) are not sent to the tagger
    pub min_chunk_chars: usize,

    /// Tagger entities shorter than this are discarded
    pub min_entity_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            context_radius: 100,
            fallback_limit: 3,
            chunk_size: 512,
            min_chunk_chars: 10,
            min_entity_chars: 4,
        }
    }
}

/// Named-entity tagger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Use the model-backed tagger when an endpoint is configured
    pub enabled: bool,

    /// Token-classification inference endpoint
    pub endpoint: Option<String>,

    /// Bearer token for the inference endpoint
    pub api_token: Option<String>,

    /// Model name (informational, sent to services that route by model)
    pub model: String,

    /// Per-chunk request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            api_token: None,
            model: "dslim/bert-base-NER".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Result store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the run artifacts
    pub dir: PathBuf,

    /// Table format for relations and entities
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output_files"),
            format: OutputFormat::Csv,
        }
    }
}

/// Supported table formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "PANLINK_OUTPUT_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable text
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("{key} has invalid value {value:?}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for crate::PanlinkError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}
