//! Logging system configuration and initialization
//!
//! Console and/or file output, plain or JSON, filtered by the configured
//! level. `RUST_LOG` takes precedence over the configuration when set.
//! Only the binary calls into this module; the scrape engine just emits
//! `tracing` events.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use super::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "prime-scraper.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const BOOTSTRAP_LEVEL: &str = "info";

// Keeps the non-blocking file writer alive for the whole process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log directory: configured path, else `<user data dir>/prime-scraper/logs`,
/// else `./logs`
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config.log_dir.clone().unwrap_or_else(|| {
        dirs::data_local_dir()
            .map(|dir| dir.join("prime-scraper"))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
            .join("logs")
    })
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Build the level filter for the configuration
///
/// Below `trace`, HTTP client internals are capped so request logs stay
/// readable. Per-module filters from the configuration are applied last.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = config.level.to_lowercase();
    let mut filter = EnvFilter::try_new(&level)
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    if level != "trace" {
        for directive in ["hyper=warn", "hyper_util=warn", "h2=warn", "reqwest=info", "tower_http=info"] {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    for (module, module_level) in &config.module_filters {
        filter = filter.add_directive(
            format!("{module}={module_level}")
                .parse()
                .with_context(|| format!("Invalid log filter for module '{module}'"))?,
        );
    }

    Ok(filter)
}

/// Subscriber for the window before the configured one is installed
pub fn bootstrap_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_LEVEL));
    fmt::Subscriber::builder()
        .with_writer(writer)
        .with_target(false)
        .with_env_filter(filter)
        .finish()
}

/// Run `f` with a stderr subscriber, so configuration loading is not silent
pub fn with_bootstrap_logging<T>(f: impl FnOnce() -> T) -> T {
    tracing::subscriber::with_default(bootstrap_subscriber(std::io::stderr), f)
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.file_output {
        let log_dir = get_log_directory(config);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let (file_writer, file_guard) = non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(file_guard);
        }

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
            .with_ansi(false);
        layers.push(if config.json_format {
            file_layer
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .boxed()
        } else {
            file_layer.with_target(false).boxed()
        });
    }

    if config.console_output {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()));
        layers.push(if config.json_format {
            console_layer.json().with_current_span(true).boxed()
        } else {
            console_layer.with_target(false).boxed()
        });
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(
        "Logging initialized (level={}, json={}, file={})",
        config.level, config.json_format, config.file_output
    );
    Ok(())
}
