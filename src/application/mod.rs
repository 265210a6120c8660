//! Application layer - the scrape engine and result assembly
//!
//! Coordinates the fetcher, the extraction rules and the assembler for a
//! single item page.

pub mod assembler;
pub mod scrape_service;

pub use assembler::Assembler;
pub use scrape_service::ScrapeService;
