//! Selector configuration for item page extraction
//!
//! Centralized CSS selectors for the extraction rules. Defaults match the
//! retailer's current detail page template.

use serde::{Deserialize, Serialize};

/// CSS selectors for item detail pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemPageSelectors {
    /// Heading carrying the title marker attribute
    pub title: String,

    /// Badge carrying the release-year marker attribute
    pub release_year: String,

    /// Fallback poster container and the image inside it
    pub poster_container: String,
    pub poster_image: String,

    /// Meta info container holding the definition lists (cast, genres, ...)
    pub meta_info_container: String,
    pub definition_list: String,
    pub definition_description: String,

    /// Related items container and the links inside it
    pub related_items_container: String,
    pub related_item_link: String,
}

impl Default for ItemPageSelectors {
    fn default() -> Self {
        Self {
            title: r#"h1[data-automation-id="title"]"#.to_string(),
            release_year: r#"span[data-automation-id="release-year-badge"]"#.to_string(),
            poster_container: "div.dv-fallback-packshot-image".to_string(),
            poster_image: "img".to_string(),
            meta_info_container: r#"div[data-automation-id="meta-info"]"#.to_string(),
            definition_list: "dl".to_string(),
            definition_description: "dd".to_string(),
            related_items_container: "div.DVWebNode-detail-btf-wrapper".to_string(),
            related_item_link: "ul li a".to_string(),
        }
    }
}

impl ItemPageSelectors {
    /// Named view over every selector, used for validation and error reporting
    pub fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("title", &self.title),
            ("release_year", &self.release_year),
            ("poster_container", &self.poster_container),
            ("poster_image", &self.poster_image),
            ("meta_info_container", &self.meta_info_container),
            ("definition_list", &self.definition_list),
            ("definition_description", &self.definition_description),
            ("related_items_container", &self.related_items_container),
            ("related_item_link", &self.related_item_link),
        ]
    }
}
