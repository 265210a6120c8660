//! Configuration infrastructure
//!
//! Layered configuration, lowest priority first:
//! 1. Compiled defaults (`defaults` module)
//! 2. Optional config file (JSON, TOML or YAML, chosen by extension)
//! 3. `PRIME_SCRAPER__SECTION__KEY` environment variables
//! 4. Legacy service variables (`AMAZON_SCRAPPER_SVC_HTTP_PORT`, `LOG_LEVEL`)
//! 5. Explicit overrides (CLI flags)
//!
//! Only this loader looks at the environment. The scrape engine receives a
//! finished [`ScraperConfig`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::parsing::ItemPageSelectors;
use crate::domain::ItemId;

pub const ENV_PREFIX: &str = "PRIME_SCRAPER";
pub const ENV_SEPARATOR: &str = "__";
pub const LEGACY_PORT_VAR: &str = "AMAZON_SCRAPPER_SVC_HTTP_PORT";
pub const LEGACY_LOG_LEVEL_VAR: &str = "LOG_LEVEL";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{field}': {message}")]
    Validation { field: String, message: String },
}

impl ConfigError {
    fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub logging: LoggingConfig,
}

/// HTTP surface settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout_seconds: u64,
}

/// Fetcher and extraction settings handed to the scrape engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Item page URL prefix; the item id is appended verbatim
    pub page_url_template: String,

    pub user_agent: String,

    /// Default per-request deadline in milliseconds
    pub request_timeout_ms: u64,

    /// Retry once on transport failures (never on HTTP statuses)
    pub retry_on_network_failure: bool,

    pub selectors: ItemPageSelectors,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Directory for log files; defaults to the user data directory
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            shutdown_timeout_seconds: defaults::SHUTDOWN_TIMEOUT_SECONDS,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_url_template: defaults::PAGE_URL_TEMPLATE.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_ms: defaults::REQUEST_TIMEOUT_MS,
            retry_on_network_failure: defaults::RETRY_ON_NETWORK_FAILURE,
            selectors: ItemPageSelectors::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters: HashMap::new(),
        }
    }
}

impl ScraperConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Deterministic page URL: template followed by the identifier
    pub fn page_url(&self, item_id: &ItemId) -> String {
        format!("{}{}", self.page_url_template, item_id)
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl AppConfig {
    /// Validate settings the type system cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::validation("server.port", "must be greater than 0"));
        }

        let template = &self.scraper.page_url_template;
        let parsed = url::Url::parse(template).map_err(|e| {
            ConfigError::validation("scraper.page_url_template", format!("{template}: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::validation(
                "scraper.page_url_template",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        if self.scraper.request_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "scraper.request_timeout_ms",
                "must be greater than 0",
            ));
        }

        for (field, selector) in self.scraper.selectors.entries() {
            if selector.trim().is_empty() {
                return Err(ConfigError::validation(
                    &format!("scraper.selectors.{field}"),
                    "selector must not be empty",
                ));
            }
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::validation(
                "logging.level",
                format!("unknown level '{}'", self.logging.level),
            ));
        }

        Ok(())
    }
}

/// Builder for the layered configuration
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
    overrides: Vec<(String, String)>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<user config dir>/prime-scraper/config.json`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("prime-scraper").join("config.json"))
    }

    /// Optional config file; a missing file is not an error
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use the given variables instead of the process environment
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Highest-priority override, keyed by dotted path (e.g. `server.port`)
    pub fn with_override(mut self, key: &str, value: impl ToString) -> Self {
        self.overrides.push((key.to_string(), value.to_string()));
        self
    }

    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = self.env.unwrap_or_else(|| std::env::vars().collect());

        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = &self.file {
            debug!("Reading configuration file: {:?}", path);
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }

        let prefixed: config::Map<String, String> = env
            .iter()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(Some(prefixed)),
            )
            .set_override_option("server.port", env.get(LEGACY_PORT_VAR).cloned())?
            .set_override_option("logging.level", env.get(LEGACY_LOG_LEVEL_VAR).cloned())?;

        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            "Configuration loaded (port={}, template={})",
            config.server.port, config.scraper.page_url_template
        );
        Ok(config)
    }
}

/// Default configuration values
pub mod defaults {
    pub const SERVER_HOST: &str = "0.0.0.0";

    pub const SERVER_PORT: u16 = 8080;

    /// Grace period for the HTTP server on shutdown
    pub const SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;

    pub const PAGE_URL_TEMPLATE: &str = "https://www.amazon.de/gp/product/";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

    pub const RETRY_ON_NETWORK_FAILURE: bool = false;

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_JSON_FORMAT: bool = false;

    pub const LOG_CONSOLE_OUTPUT: bool = true;

    pub const LOG_FILE_OUTPUT: bool = false;
}
