//! Archive pages that group links under one heading per day.
//!
//! ```html
//! <main><article>
//!   <h3>Monday 3 June</h3>
//!   <ul><li><a href="/update/one">One</a></li><li><a href="/update/two">Two</a></li></ul>
//!   <h3>Friday 31 May</h3>
//!   <ul><li><a href="/update/three">Three</a></li></ul>
//! </article></main>
//! ```
//!
//! Each item takes the date of the nearest heading that precedes it: the
//! container's own earlier siblings first, then each ancestor's earlier
//! siblings, up to [`MAX_ANCESTOR_HOPS`] levels. Headings usually omit the
//! year, which is filled in from `today`.

use super::{DateFragment, Extract, build_item, date_text_of, finish_batch};
use crate::config::Source;
use crate::dates::infer_year;
use crate::models::ItemBatch;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::instrument;

pub const MAX_ANCESTOR_HOPS: usize = 4;

/// Extractor for `day_headings` sources.
#[derive(Debug, Clone, Copy)]
pub struct DayHeadingExtractor {
    pub max_items: usize,
    /// Reference date for completing year-less headings.
    pub today: NaiveDate,
}

impl Extract for DayHeadingExtractor {
    #[instrument(level = "debug", skip_all, fields(source = %source.name()))]
    fn extract(&self, document: &Html, source: &Source) -> ItemBatch {
        let results = document
            .select(&source.rules.container)
            .take(self.max_items)
            .map(|container| {
                let date = source
                    .rules
                    .date
                    .as_ref()
                    .and_then(|heading| preceding_heading(container, heading))
                    .and_then(|el| date_text_of(el, source))
                    .map(|display| DateFragment {
                        parse: infer_year(&display, self.today),
                        display,
                    });
                build_item(container, source, date)
            });
        finish_batch(source, results)
    }
}

/// Nearest element matching `heading` that comes before `container`.
///
/// A preceding sibling either is the heading or wraps it, in which case its
/// last matching descendant is the nearest one.
fn preceding_heading<'a>(container: ElementRef<'a>, heading: &Selector) -> Option<ElementRef<'a>> {
    let mut node = *container;
    for _ in 0..=MAX_ANCESTOR_HOPS {
        for sibling in node.prev_siblings() {
            let Some(el) = ElementRef::wrap(sibling) else {
                continue;
            };
            if heading.matches(&el) {
                return Some(el);
            }
            if let Some(nested) = el.select(heading).last() {
                return Some(nested);
            }
        }
        node = node.parent()?;
    }
    None
}
