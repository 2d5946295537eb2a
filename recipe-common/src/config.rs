//! Configuration loading and resolution
//!
//! Configuration file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `RECIPE_INGEST_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/recipe-ingest/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! After the TOML layer is loaded, individual secrets and settings may be
//! overridden from the environment (`NOTION_API_KEY`, `NOTION_DATABASE_ID`,
//! `RECIPE_LLM_API_KEY`/`OPENAI_API_KEY`, `RECIPE_LLM_MODEL`, `RECIPE_BIND_ADDR`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RECIPE_INGEST_CONFIG";

/// Upper bound accepted for `http.max_retries`
const MAX_RETRIES_LIMIT: u32 = 10;

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub notion: NotionConfig,
    pub http: HttpConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5730".to_string(),
        }
    }
}

/// Destination store (Notion) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    /// Integration token
    pub api_key: Option<String>,
    /// Database used to resolve `Unique ID` properties to page ids
    pub database_id: Option<String>,
    pub api_url: String,
    /// Value sent in the `Notion-Version` header
    pub api_version: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            api_url: "https://api.notion.com/v1".to_string(),
            api_version: "2022-06-28".to_string(),
        }
    }
}

/// Outbound HTTP client settings shared by all page fetches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub initial_backoff_ms: u64,
    pub retry_statuses: Vec<u16>,
    pub user_agent: String,
    /// How long a fetched page (or fetch failure) is reused by later
    /// extraction stages; 0 disables reuse
    pub page_cache_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            initial_backoff_ms: 500,
            retry_statuses: vec![429, 500, 502, 503, 504],
            user_agent: concat!(
                "Mozilla/5.0 (compatible; recipe-ingest/",
                env!("CARGO_PKG_VERSION"),
                ")"
            )
            .to_string(),
            page_cache_secs: 60,
        }
    }
}

/// Generative model settings for the AI-assisted fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Without a key the fallback stage is skipped
    pub api_key: Option<String>,
    /// OpenAI-compatible chat completions endpoint
    pub api_url: String,
    pub model: String,
    /// Prefix of the raw HTML sent to the model
    pub max_html_chars: usize,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_html_chars: 8000,
            timeout_secs: 30,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Parse configuration from TOML text (missing keys use defaults)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides using an arbitrary variable lookup
    ///
    /// Blank values are treated as unset.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("NOTION_API_KEY") {
            debug!("Notion API key overridden from environment");
            self.notion.api_key = Some(key);
        }
        if let Some(id) = get("NOTION_DATABASE_ID") {
            self.notion.database_id = Some(id);
        }
        if let Some(key) = get("RECIPE_LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            debug!("LLM API key overridden from environment");
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("RECIPE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(addr) = get("RECIPE_BIND_ADDR") {
            self.server.bind_address = addr;
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be greater than 0".to_string()));
        }
        if self.http.max_retries > MAX_RETRIES_LIMIT {
            return Err(Error::Config(format!(
                "http.max_retries must be at most {} (got {})",
                MAX_RETRIES_LIMIT, self.http.max_retries
            )));
        }
        if self.llm.max_html_chars == 0 {
            return Err(Error::Config("llm.max_html_chars must be greater than 0".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recipe-ingest").join("config.toml"))
}

/// Resolve which configuration file to read
///
/// Returns `Ok(None)` when no explicit path was given and the platform
/// default does not exist. An explicit path (CLI or env) must exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = cli_arg {
        return require_existing(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return require_existing(PathBuf::from(path));
    }

    Ok(default_config_path().filter(|p| p.exists()))
}

fn require_existing(path: PathBuf) -> Result<Option<PathBuf>> {
    if path.exists() {
        Ok(Some(path))
    } else {
        Err(Error::Config(format!("Config file not found: {}", path.display())))
    }
}

/// Load configuration: file layer, then environment overrides, then validation
pub fn load_config(cli_arg: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match resolve_config_path(cli_arg)? {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let config = ServiceConfig::from_toml_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            info!("Configuration loaded from {}", path.display());
            config
        }
        None => {
            info!("No configuration file found, using defaults");
            ServiceConfig::default()
        }
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Write configuration as TOML (temp file + rename)
pub fn write_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Internal(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Shorten a secret for logging (first 4 characters only)
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}…", prefix)
}
