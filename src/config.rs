//! Configuration system for GPT Studio
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (GPT_STUDIO_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};

/// Placeholder shown instead of a configured API key.
const REDACTED: &str = "********";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote completion service settings
    pub openai: OpenAiSettings,

    /// Data storage paths
    pub storage: StorageSettings,

    /// Shareable link settings
    pub sharing: SharingSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// OpenAI-compatible completion service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// API key (empty = use the credentials file, or the local fallback when none is stored)
    pub api_key: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Upper bound on completion tokens
    pub max_tokens: u32,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Storage path settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Base data directory
    pub data_dir: String,

    /// Directory holding one JSON document per persona
    pub persona_dir: String,

    /// File holding the stored API key
    pub credentials_file: String,
}

/// Shareable link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingSettings {
    /// Base URL that `/gpt/<id>` is appended to
    pub base_url: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.gpt-studio".to_string(),
            persona_dir: "~/.gpt-studio/personas".to_string(),
            credentials_file: "~/.gpt-studio/credentials".to_string(),
        }
    }
}

impl Default for SharingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", path.display(), e),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        let search_paths = [
            // Current directory
            Some(PathBuf::from("gpt-studio.toml")),
            // User config directory
            dirs::config_dir().map(|p| p.join("gpt-studio").join("config.toml")),
            // Home directory
            dirs::home_dir().map(|p| p.join(".gpt-studio").join("config.toml")),
        ];

        for path in search_paths.iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the process environment in production)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // OpenAI settings
        if let Some(val) = lookup("GPT_STUDIO_OPENAI_BASE_URL") {
            self.openai.base_url = val;
        }
        if let Some(val) = lookup("GPT_STUDIO_OPENAI_API_KEY") {
            self.openai.api_key = val;
        }
        if let Some(val) = lookup("GPT_STUDIO_OPENAI_MODEL") {
            self.openai.model = val;
        }
        if let Some(n) = lookup("GPT_STUDIO_OPENAI_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.openai.max_tokens = n;
        }
        if let Some(n) = lookup("GPT_STUDIO_OPENAI_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.openai.temperature = n;
        }
        if let Some(n) = lookup("GPT_STUDIO_OPENAI_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.openai.timeout_secs = n;
        }

        // Storage settings; a new data dir re-roots the paths beneath it
        if let Some(val) = lookup("GPT_STUDIO_DATA_DIR") {
            let root = Path::new(&val);
            self.storage.persona_dir = root.join("personas").to_string_lossy().into_owned();
            self.storage.credentials_file =
                root.join("credentials").to_string_lossy().into_owned();
            self.storage.data_dir = val;
        }
        if let Some(val) = lookup("GPT_STUDIO_PERSONA_DIR") {
            self.storage.persona_dir = val;
        }
        if let Some(val) = lookup("GPT_STUDIO_CREDENTIALS_FILE") {
            self.storage.credentials_file = val;
        }

        // Sharing settings
        if let Some(val) = lookup("GPT_STUDIO_SHARE_BASE_URL") {
            self.sharing.base_url = val;
        }

        // Logging settings
        if let Some(val) = lookup("GPT_STUDIO_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("GPT_STUDIO_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Some(val) = lookup("GPT_STUDIO_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.data_dir = expand_path(&self.storage.data_dir);
        self.storage.persona_dir = expand_path(&self.storage.persona_dir);
        self.storage.credentials_file = expand_path(&self.storage.credentials_file);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_http_url("openai.base_url", &self.openai.base_url)?;
        validate_http_url("sharing.base_url", &self.sharing.base_url)?;

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(Error::config_field_invalid(
                "openai.temperature",
                format!(
                    "temperature must be between 0.0 and 2.0 (got {})",
                    self.openai.temperature
                ),
            ));
        }
        if self.openai.max_tokens == 0 {
            return Err(Error::config_field_invalid(
                "openai.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }
        if self.openai.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "openai.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Copy of the configuration that is safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.openai.api_key.is_empty() {
            copy.openai.api_key = REDACTED.to_string();
        }
        copy
    }

    /// Get the data directory as a PathBuf
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    /// Get the persona directory as a PathBuf
    pub fn persona_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.persona_dir)
    }

    /// Get the credentials file as a PathBuf
    pub fn credentials_file(&self) -> PathBuf {
        PathBuf::from(&self.storage.credentials_file)
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value).map_err(|e| {
        Error::config_field_invalid(field, format!("'{}' is not a valid URL: {}", value, e))
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::config_field_invalid(
            field,
            format!("'{}' must start with http:// or https://", value),
        ));
    }
    Ok(())
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default location written by `config init`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gpt-studio")
        .join("config.toml")
}

/// Initialize a new configuration file, returning where it was written
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    info!(path = %config_path.display(), "Configuration file created");
    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# GPT Studio Configuration

[openai]
# API base URL of any OpenAI-compatible chat completion service
base_url = "https://api.openai.com/v1"

# API key (leave empty to use `gpt-studio key set`; with no key at all,
# replies are composed locally)
api_key = ""

# Model identifier
model = "gpt-3.5-turbo"

# Upper bound on completion tokens
max_tokens = 1000

# Sampling temperature (0.0 - 2.0)
temperature = 0.7

# Request timeout in seconds; a timeout falls back to a local reply
timeout_secs = 30

[storage]
# Base data directory
data_dir = "~/.gpt-studio"

# One JSON document per persona
persona_dir = "~/.gpt-studio/personas"

# Stored API key (owner-only permissions on unix)
credentials_file = "~/.gpt-studio/credentials"

[sharing]
# Shareable links look like <base_url>/gpt/<persona-id>
base_url = "http://localhost:5173"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.gpt-studio/logs/gpt-studio.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
