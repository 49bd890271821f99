//! Data models for source configuration and the items the pipeline produces.
//!
//! - [`SourceDescriptor`]: static, declarative description of one site
//! - [`CanonicalItem`]: one normalized listing entry, either [`DatedItem`] or
//!   [`UndatedItem`]
//! - [`ItemBatch`]: the items one extractor produced for one source in one run
//! - [`AggregatedFeed`]: the published, ordered result of a run
//!
//! Items serialize with camelCase keys so that the dated and undated variants
//! share one wire shape: `{title, url, source, date?, sortKey?}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which extractor variant understands a source's markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Repeating containers, each carrying its own link and optional date.
    #[default]
    Listing,
    /// Archive pages that group links under per-day headings.
    DayHeadings,
}

/// CSS selectors describing where the pieces of an item live.
///
/// `link`, `title` and `date` are evaluated inside each `container` match.
/// With no `link` selector the container itself is the link element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractionRules {
    pub container: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// Read the date from this attribute (e.g. `datetime`) instead of the text.
    #[serde(default)]
    pub date_attr: Option<String>,
}

/// Immutable configuration for one source, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    /// Display name; unique across the configured list.
    pub name: String,
    pub fetch_url: String,
    /// Prefix applied to relative links.
    pub base_url: String,
    #[serde(default)]
    pub kind: ExtractorKind,
    pub rules: ExtractionRules,
}

impl SourceDescriptor {
    /// Sources without a date rule only ever yield dateless items.
    pub fn is_dated(&self) -> bool {
        self.rules.date.is_some()
    }
}

/// An item with a successfully normalized publish date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedItem {
    pub title: String,
    pub url: String,
    pub source: String,
    /// The date as displayed by the source.
    pub date: String,
    pub sort_key: i64,
}

/// An item without a usable date; placed by position, never sorted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UndatedItem {
    pub title: String,
    pub url: String,
    pub source: String,
}

/// The unit of output.
///
/// Carrying both `date` and `sortKey`, or neither, is enforced by the variants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CanonicalItem {
    Dated(DatedItem),
    Undated(UndatedItem),
}

impl CanonicalItem {
    pub fn title(&self) -> &str {
        match self {
            CanonicalItem::Dated(i) => &i.title,
            CanonicalItem::Undated(i) => &i.title,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            CanonicalItem::Dated(i) => &i.url,
            CanonicalItem::Undated(i) => &i.url,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            CanonicalItem::Dated(i) => &i.source,
            CanonicalItem::Undated(i) => &i.source,
        }
    }

    pub fn sort_key(&self) -> Option<i64> {
        match self {
            CanonicalItem::Dated(i) => Some(i.sort_key),
            CanonicalItem::Undated(_) => None,
        }
    }
}

impl From<DatedItem> for CanonicalItem {
    fn from(item: DatedItem) -> Self {
        CanonicalItem::Dated(item)
    }
}

impl From<UndatedItem> for CanonicalItem {
    fn from(item: UndatedItem) -> Self {
        CanonicalItem::Undated(item)
    }
}

/// Items from one extractor invocation, in document order.
pub type ItemBatch = Vec<CanonicalItem>;

/// The published result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AggregatedFeed {
    pub generated_at: DateTime<Utc>,
    pub items: Vec<CanonicalItem>,
}

impl AggregatedFeed {
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            items: Vec::new(),
        }
    }

    /// Items attributed to `source`, in feed order.
    pub fn by_source(&self, source: &str) -> Vec<CanonicalItem> {
        self.items
            .iter()
            .filter(|item| item.source() == source)
            .cloned()
            .collect()
    }
}
