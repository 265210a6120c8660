//! Output record of one scrape
//!
//! Field names are fixed by the HTTP contract. Absent strings travel as
//! `""` and absent lists as `[]`, so consumers never see `null`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, serialize_with = "empty_if_none", deserialize_with = "none_if_empty")]
    pub title: Option<String>,

    #[serde(default, serialize_with = "empty_if_none", deserialize_with = "none_if_empty")]
    pub release_year: Option<String>,

    /// Source document order
    #[serde(default)]
    pub actors: Vec<String>,

    #[serde(default, serialize_with = "empty_if_none", deserialize_with = "none_if_empty")]
    pub poster: Option<String>,

    /// Source document order
    #[serde(default)]
    pub similar_ids: Vec<String>,
}

impl Record {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.release_year.is_none()
            && self.poster.is_none()
            && self.actors.is_empty()
            && self.similar_ids.is_empty()
    }

    /// Number of fields a record carries
    pub const FIELD_COUNT: usize = 5;

    /// Number of populated fields, used for logging
    pub fn populated_fields(&self) -> usize {
        let present: [bool; Self::FIELD_COUNT] = [
            self.title.is_some(),
            self.release_year.is_some(),
            self.poster.is_some(),
            !self.actors.is_empty(),
            !self.similar_ids.is_empty(),
        ];
        present.into_iter().filter(|present| *present).count()
    }
}

#[allow(clippy::ref_option)]
fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

fn none_if_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
