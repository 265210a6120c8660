//! HTML extraction infrastructure
//!
//! A fixed, ordered set of independent rules run against one immutable
//! parsed document. Every rule runs regardless of what the others found;
//! results come back as tagged values for the assembler to merge.

pub mod config;
pub mod item_page_rules;

pub use config::ItemPageSelectors;
pub use item_page_rules::{ActorsRule, FirstTextRule, PosterRule, SimilarIdsRule};

use anyhow::{Context, Result};
use scraper::Html;
use tracing::debug;

/// One extracted field, tagged with the record slot it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Title(String),
    ReleaseYear(String),
    Poster(String),
    Actors(Vec<String>),
    SimilarIds(Vec<String>),
}

/// Stateless mapping from a parsed document to at most one field value
pub trait ExtractionRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the rule's target is missing or only partially present
    fn apply(&self, document: &Html) -> Option<FieldValue>;
}

/// Ordered rule collection, fixed at construction time
pub struct RuleSet {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn ExtractionRule>>) -> Self {
        Self { rules }
    }

    /// Build the item page rules from configured selectors
    pub fn from_selectors(selectors: &ItemPageSelectors) -> Result<Self> {
        let rules: Vec<Box<dyn ExtractionRule>> = vec![
            Box::new(FirstTextRule::title(selectors).context("Failed to build title rule")?),
            Box::new(
                FirstTextRule::release_year(selectors)
                    .context("Failed to build release year rule")?,
            ),
            Box::new(PosterRule::new(selectors).context("Failed to build poster rule")?),
            Box::new(ActorsRule::new(selectors).context("Failed to build actors rule")?),
            Box::new(SimilarIdsRule::new(selectors).context("Failed to build similar ids rule")?),
        ];
        Ok(Self::new(rules))
    }

    /// Run every rule against the document, in order, without short-circuiting
    pub fn apply_all(&self, document: &Html) -> Vec<FieldValue> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let value = rule.apply(document);
                if value.is_none() {
                    debug!("Rule '{}' found nothing", rule.name());
                }
                value
            })
            .collect()
    }

    /// Parse raw markup and run every rule against it
    pub fn extract(&self, raw: &str) -> Vec<FieldValue> {
        let document = Html::parse_document(raw);
        self.apply_all(&document)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRule {
        calls: Arc<AtomicUsize>,
        value: Option<FieldValue>,
    }

    impl ExtractionRule for CountingRule {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn apply(&self, _document: &Html) -> Option<FieldValue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value.clone()
        }
    }

    #[test]
    fn test_default_rule_set_has_one_rule_per_field() {
        let rules = RuleSet::from_selectors(&ItemPageSelectors::default()).unwrap();
        assert_eq!(rules.len(), 5);
        assert_eq!(
            format!("{rules:?}"),
            r#"["title", "release_year", "poster", "actors", "similar_ids"]"#
        );
    }

    #[test]
    fn test_every_rule_runs_even_after_misses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rules = RuleSet::new(vec![
            Box::new(CountingRule { calls: calls.clone(), value: None }),
            Box::new(CountingRule {
                calls: calls.clone(),
                value: Some(FieldValue::Title("T".into())),
            }),
            Box::new(CountingRule { calls: calls.clone(), value: None }),
        ]);

        let values = rules.extract("<html></html>");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(values, vec![FieldValue::Title("T".into())]);
    }

    #[test]
    fn test_unrelated_page_yields_nothing() {
        let rules = RuleSet::from_selectors(&ItemPageSelectors::default()).unwrap();
        assert!(rules.extract("<html><body><p>Captcha</p></body></html>").is_empty());
    }
}
