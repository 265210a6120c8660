//! Merges per-rule results into a [`Record`]
//!
//! The record is built locally and only handed out once complete. A page
//! that yields no field at all is classified as not found.

use tracing::debug;

use crate::domain::Record;
use crate::infrastructure::parsing::FieldValue;
use crate::infrastructure::scrape_error::{ScrapeError, ScrapeResult};

pub struct Assembler;

impl Assembler {
    /// Fold tagged values into a record; the first value for a slot wins
    pub fn assemble(url: &str, values: Vec<FieldValue>) -> ScrapeResult<Record> {
        let mut record = Record::default();

        for value in values {
            match value {
                FieldValue::Title(title) => {
                    record.title.get_or_insert(title);
                }
                FieldValue::ReleaseYear(year) => {
                    record.release_year.get_or_insert(year);
                }
                FieldValue::Poster(poster) => {
                    record.poster.get_or_insert(poster);
                }
                FieldValue::Actors(actors) if record.actors.is_empty() => record.actors = actors,
                FieldValue::SimilarIds(ids) if record.similar_ids.is_empty() => {
                    record.similar_ids = ids;
                }
                duplicate => debug!("Ignoring duplicate field value: {:?}", duplicate),
            }
        }

        if record.is_empty() {
            return Err(ScrapeError::not_found(url));
        }
        Ok(record)
    }
}
