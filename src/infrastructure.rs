//! Infrastructure layer: configuration, logging, page fetching and HTML extraction

pub mod config;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod scrape_error;

pub use config::{AppConfig, ConfigLoader, LoggingConfig, ScraperConfig, ServerConfig};
pub use http_client::{HttpPageFetcher, PageFetcher, RawDocument};
pub use parsing::{ExtractionRule, FieldValue, ItemPageSelectors, RuleSet};
pub use scrape_error::{ErrorKind, ExtractionError, FetchError, ScrapeError, ScrapeResult};
