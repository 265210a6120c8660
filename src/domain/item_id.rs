//! Item identifier value object
//!
//! An `ItemId` can only be obtained through [`ItemId::parse`], so holding one
//! proves the identifier passed the alphanumeric check before any network
//! access happens.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::infrastructure::scrape_error::{ScrapeError, ScrapeResult};

static ITEM_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("item id pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn parse(raw: impl Into<String>) -> ScrapeResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ScrapeError::validation(&raw, "identifier is empty"));
        }
        if !ITEM_ID_PATTERN.is_match(&raw) {
            return Err(ScrapeError::validation(
                &raw,
                "identifier must be ASCII alphanumeric",
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ItemId {
    type Error = ScrapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for ItemId {
    type Error = ScrapeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
