//! Per-source extraction of canonical items from a fetched page.
//!
//! Every extractor implements [`Extract`]: given the parsed document and the
//! [`Source`] it came from, produce an [`ItemBatch`] in document order. The
//! variants differ only in where an item's date comes from:
//!
//! | Kind | Module | Date location |
//! |------|--------|---------------|
//! | `listing` | [`listing`] | inside each container (text or attribute) |
//! | `day_headings` | [`day_headings`] | nearest preceding day heading |
//!
//! # Common rules
//!
//! - At most `max_items` containers are looked at, the first N in document order
//! - A container without a link, an `href`, a resolvable URL or a title is
//!   skipped on its own; the rest of the batch is unaffected
//! - A missing or unparseable date makes the item dateless, never drops it
//! - A URL already seen earlier in the batch is dropped

pub mod day_headings;
pub mod listing;

use crate::config::Source;
use crate::dates::normalize;
use crate::error::ShapeMismatch;
use crate::models::{CanonicalItem, DatedItem, ExtractorKind, ItemBatch, UndatedItem};
use crate::utils::{capitalize, resolve_url};
use chrono::{Local, NaiveDate};
use itertools::Itertools;
use scraper::{ElementRef, Html};
use tracing::{debug, info};

pub use day_headings::DayHeadingExtractor;
pub use listing::ListingExtractor;

/// The one capability every source variant provides.
pub trait Extract {
    fn extract(&self, document: &Html, source: &Source) -> ItemBatch;
}

/// Parse `body` and run the extractor matching the source's kind.
pub fn extract_page(body: &str, source: &Source, max_items: usize) -> ItemBatch {
    let document = Html::parse_document(body);
    extract_document(&document, source, max_items, Local::now().date_naive())
}

/// Run the extractor for `source.descriptor.kind` over an already parsed page.
///
/// `today` completes year-less dates.
pub fn extract_document(
    document: &Html,
    source: &Source,
    max_items: usize,
    today: NaiveDate,
) -> ItemBatch {
    match source.descriptor.kind {
        ExtractorKind::Listing => ListingExtractor { max_items }.extract(document, source),
        ExtractorKind::DayHeadings => {
            DayHeadingExtractor { max_items, today }.extract(document, source)
        }
    }
}

/// A located date: what the page shows, and what gets normalized.
///
/// The two differ when an extractor completed a year-less date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DateFragment {
    pub display: String,
    pub parse: String,
}

impl DateFragment {
    pub fn verbatim(text: String) -> Self {
        Self {
            parse: text.clone(),
            display: text,
        }
    }
}

/// All text beneath `el`, whitespace-collapsed.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Date text of a date element: the configured attribute, or its text.
pub(crate) fn date_text_of(el: ElementRef<'_>, source: &Source) -> Option<String> {
    let raw = match source.rules.date_attr.as_deref() {
        Some(attr) => el.value().attr(attr)?.trim().to_string(),
        None => text_of(el),
    };
    (!raw.is_empty()).then_some(raw)
}

/// Build one item from a container.
pub(crate) fn build_item(
    container: ElementRef<'_>,
    source: &Source,
    date: Option<DateFragment>,
) -> Result<CanonicalItem, ShapeMismatch> {
    let rules = &source.rules;
    let desc = &source.descriptor;

    let link = match &rules.link {
        Some(sel) => container.select(sel).next().ok_or_else(|| {
            ShapeMismatch::MissingLink(desc.rules.link.clone().unwrap_or_default())
        })?,
        None => container,
    };

    let href = link.value().attr("href").ok_or(ShapeMismatch::MissingHref)?;
    let url = resolve_url(&desc.base_url, href).ok_or_else(|| ShapeMismatch::BadUrl {
        href: href.to_string(),
        base: desc.base_url.clone(),
    })?;

    let title_text = rules
        .title
        .as_ref()
        .and_then(|sel| container.select(sel).next())
        .map(text_of)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| text_of(link));
    let title = capitalize(&title_text);
    if title.is_empty() {
        return Err(ShapeMismatch::EmptyTitle);
    }

    let source_name = desc.name.clone();
    let Some(date) = date else {
        return Ok(UndatedItem {
            title,
            url,
            source: source_name,
        }
        .into());
    };

    match normalize(&date.parse) {
        Ok(sort_key) => Ok(DatedItem {
            title,
            url,
            source: source_name,
            date: date.display,
            sort_key,
        }
        .into()),
        Err(e) => {
            debug!(source = %desc.name, %url, error = %e, "Treating item as dateless");
            Ok(UndatedItem {
                title,
                url,
                source: source_name,
            }
            .into())
        }
    }
}

/// Collect per-container results into a batch: skip mismatches, drop repeated URLs.
pub(crate) fn finish_batch<I>(source: &Source, results: I) -> ItemBatch
where
    I: IntoIterator<Item = Result<CanonicalItem, ShapeMismatch>>,
{
    let mut skipped = 0usize;
    let built: Vec<CanonicalItem> = results
        .into_iter()
        .filter_map(|res| match res {
            Ok(item) => Some(item),
            Err(e) => {
                skipped += 1;
                debug!(source = %source.name(), error = %e, "Skipping item");
                None
            }
        })
        .collect();

    let before = built.len();
    let batch: ItemBatch = built
        .into_iter()
        .unique_by(|item| item.url().to_string())
        .collect();

    let dated = batch.iter().filter(|i| i.sort_key().is_some()).count();
    info!(
        source = %source.name(),
        count = batch.len(),
        dated,
        skipped,
        duplicates = before - batch.len(),
        "Extracted items"
    );
    batch
}
