//! Scrape engine façade
//!
//! `scrape` runs validate → fetch → parse → extract → assemble for one item
//! id. Nothing is shared between invocations except the immutable rule set
//! and the fetcher handle.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::assembler::Assembler;
use crate::domain::{ItemId, Record};
use crate::infrastructure::config::ScraperConfig;
use crate::infrastructure::http_client::{HttpPageFetcher, PageFetcher};
use crate::infrastructure::parsing::RuleSet;
use crate::infrastructure::scrape_error::ScrapeResult;

#[derive(Clone)]
pub struct ScrapeService {
    fetcher: Arc<dyn PageFetcher>,
    rules: Arc<RuleSet>,
    default_deadline: Duration,
}

impl ScrapeService {
    /// Build the HTTP fetcher and item page rules from configuration
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let rules = RuleSet::from_selectors(&config.selectors)
            .context("Failed to compile item page selectors")?;
        let default_deadline = config.request_timeout();
        let fetcher = HttpPageFetcher::new(config)?;

        Ok(Self::with_parts(Arc::new(fetcher), rules, default_deadline))
    }

    pub fn with_parts(fetcher: Arc<dyn PageFetcher>, rules: RuleSet, default_deadline: Duration) -> Self {
        Self {
            fetcher,
            rules: Arc::new(rules),
            default_deadline,
        }
    }

    pub const fn default_deadline(&self) -> Duration {
        self.default_deadline
    }

    /// Scrape with the configured deadline
    pub async fn scrape(&self, item_id: &str) -> ScrapeResult<Record> {
        self.scrape_with_deadline(item_id, self.default_deadline).await
    }

    /// Scrape one item; `deadline` bounds only the network fetch
    pub async fn scrape_with_deadline(&self, item_id: &str, deadline: Duration) -> ScrapeResult<Record> {
        let span = info_span!("scrape", item_id = %item_id, invocation = %Uuid::new_v4());

        async move {
            let item_id = ItemId::parse(item_id).inspect_err(|e| warn!("{}", e))?;

            let raw = self
                .fetcher
                .fetch(&item_id, deadline)
                .await
                .inspect_err(|e| warn!("{}", e))?;

            let values = self.rules.extract(&raw.body);
            let record = Assembler::assemble(&raw.url, values).inspect_err(|e| warn!("{}", e))?;

            info!(
                "Scraped {} ({} of {} fields)",
                item_id,
                record.populated_fields(),
                Record::FIELD_COUNT
            );
            Ok(record)
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ScrapeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeService")
            .field("rules", &self.rules)
            .field("default_deadline", &self.default_deadline)
            .finish_non_exhaustive()
    }
}
