//! Prime Scraper - single item page scraping
//!
//! Fetches one retailer item page, runs a fixed set of extraction rules
//! over the parsed document and returns a normalized [`Record`], or a
//! classified failure.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod server;

pub use application::ScrapeService;
pub use domain::{ItemId, Record};
pub use infrastructure::{AppConfig, ConfigLoader, ErrorKind, FetchError, ScrapeError, ScrapeResult};
