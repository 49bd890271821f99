//! Listing pages: a run of repeating containers, each with its own link and
//! optionally its own date element.
//!
//! ```html
//! <article>
//!   <h2 class="post-item-title"><a href="/story">Story title</a></h2>
//!   <time datetime="2024-03-03">March 3</time>
//! </article>
//! ```

use super::{DateFragment, Extract, build_item, date_text_of, finish_batch};
use crate::config::Source;
use crate::models::ItemBatch;
use scraper::Html;
use tracing::instrument;

/// Extractor for `listing` sources.
#[derive(Debug, Clone, Copy)]
pub struct ListingExtractor {
    pub max_items: usize,
}

impl Extract for ListingExtractor {
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
                    .and_then(|sel| container.select(sel).next())
                    .and_then(|el| date_text_of(el, source))
                    .map(DateFragment::verbatim);
                build_item(container, source, date)
            });
        finish_batch(source, results)
    }
}
