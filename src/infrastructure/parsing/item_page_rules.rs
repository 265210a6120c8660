//! Extraction rules for item detail pages
//!
//! One rule per output field. Rules only read the parsed document and
//! report what they found as a tagged [`FieldValue`]; a miss is `None`,
//! never an error.

use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::config::ItemPageSelectors;
use super::{ExtractionRule, FieldValue};

/// Actors live in the second definition list of the meta info block.
pub const ACTORS_DEFINITION_INDEX: usize = 1;

/// `/gp/video/detail/<ID>/...` splits into `["", "gp", "video", "detail", "<ID>", ...]`.
pub const SIMILAR_ID_SEGMENT: usize = 4;

/// Compile a configured selector, naming the field on failure
pub(crate) fn compile_selector(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| anyhow!("Invalid CSS selector for '{field}': {selector} - {e}"))
}

fn trimmed_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// First element matching a selector, as trimmed text.
/// Shared by the title and release-year rules.
pub struct FirstTextRule {
    name: &'static str,
    selector: Selector,
    wrap: fn(String) -> FieldValue,
}

impl FirstTextRule {
    pub fn title(selectors: &ItemPageSelectors) -> Result<Self> {
        Ok(Self {
            name: "title",
            selector: compile_selector("title", &selectors.title)?,
            wrap: FieldValue::Title,
        })
    }

    pub fn release_year(selectors: &ItemPageSelectors) -> Result<Self> {
        Ok(Self {
            name: "release_year",
            selector: compile_selector("release_year", &selectors.release_year)?,
            wrap: FieldValue::ReleaseYear,
        })
    }
}

impl ExtractionRule for FirstTextRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, document: &Html) -> Option<FieldValue> {
        let element = document.select(&self.selector).next()?;
        let text = trimmed_text(element)?;
        debug!("Extracted {}: {}", self.name, text);
        Some((self.wrap)(text))
    }
}

/// Poster URL from the fallback packshot image's `srcset`
pub struct PosterRule {
    container: Selector,
    image: Selector,
}

impl PosterRule {
    pub fn new(selectors: &ItemPageSelectors) -> Result<Self> {
        Ok(Self {
            container: compile_selector("poster_container", &selectors.poster_container)?,
            image: compile_selector("poster_image", &selectors.poster_image)?,
        })
    }
}

/// URL part of the first `srcset` candidate: `"url1 1x, url2 2x"` gives `url1`
pub fn first_srcset_url(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .next()?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

impl ExtractionRule for PosterRule {
    fn name(&self) -> &'static str {
        "poster"
    }

    fn apply(&self, document: &Html) -> Option<FieldValue> {
        let image = document
            .select(&self.container)
            .find_map(|container| container.select(&self.image).next())?;

        let Some(srcset) = image.value().attr("srcset") else {
            debug!("Poster image found without srcset");
            return None;
        };

        first_srcset_url(srcset).map(FieldValue::Poster)
    }
}

/// Comma-separated cast list from the meta info block
pub struct ActorsRule {
    container: Selector,
    definition_list: Selector,
    description: Selector,
}

impl ActorsRule {
    pub fn new(selectors: &ItemPageSelectors) -> Result<Self> {
        Ok(Self {
            container: compile_selector("meta_info_container", &selectors.meta_info_container)?,
            definition_list: compile_selector("definition_list", &selectors.definition_list)?,
            description: compile_selector(
                "definition_description",
                &selectors.definition_description,
            )?,
        })
    }
}

/// Split on commas, trim, drop empties
pub fn split_names(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl ExtractionRule for ActorsRule {
    fn name(&self) -> &'static str {
        "actors"
    }

    fn apply(&self, document: &Html) -> Option<FieldValue> {
        let container = document.select(&self.container).next()?;
        let definition_list = container
            .select(&self.definition_list)
            .nth(ACTORS_DEFINITION_INDEX)?;

        let actors: Vec<String> = definition_list
            .select(&self.description)
            .flat_map(|dd| split_names(&dd.text().collect::<String>()))
            .collect();

        if actors.is_empty() {
            return None;
        }
        debug!("Extracted {} actors", actors.len());
        Some(FieldValue::Actors(actors))
    }
}

/// Identifiers of related items, taken from their link paths
pub struct SimilarIdsRule {
    container: Selector,
    link: Selector,
}

impl SimilarIdsRule {
    pub fn new(selectors: &ItemPageSelectors) -> Result<Self> {
        Ok(Self {
            container: compile_selector(
                "related_items_container",
                &selectors.related_items_container,
            )?,
            link: compile_selector("related_item_link", &selectors.related_item_link)?,
        })
    }
}

/// Identifier segment of a related item href, `None` when the path is too
/// short to have one. An empty segment is returned as is.
pub fn similar_id_from_href(href: &str) -> Option<String> {
    href.split('/').nth(SIMILAR_ID_SEGMENT).map(str::to_string)
}

impl ExtractionRule for SimilarIdsRule {
    fn name(&self) -> &'static str {
        "similar_ids"
    }

    fn apply(&self, document: &Html) -> Option<FieldValue> {
        let mut ids = Vec::new();

        for container in document.select(&self.container) {
            for link in container.select(&self.link) {
                let Some(href) = link.value().attr("href") else {
                    continue;
                };
                match similar_id_from_href(href) {
                    Some(id) => ids.push(id),
                    None => trace!("Skipping malformed related item link: {}", href),
                }
            }
        }

        if ids.is_empty() {
            return None;
        }
        debug!("Extracted {} similar ids", ids.len());
        Some(FieldValue::SimilarIds(ids))
    }
}
