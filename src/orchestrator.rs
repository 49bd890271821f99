//! One fetch per source, all in flight together, settled before anything
//! downstream runs.
//!
//! A source that fails to fetch (transport error, bad status, timeout)
//! contributes an empty batch and an `error!` line with the request
//! diagnostics. The run itself never fails here.

use crate::config::Source;
use crate::error::TransportError;
use crate::fetch::Fetch;
use crate::models::ItemBatch;
use crate::scrapers::extract_page;
use crate::utils::truncate_for_log;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

/// Batches keyed by source name, in the order the sources were configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatches {
    entries: Vec<(String, ItemBatch)>,
}

impl SourceBatches {
    pub fn get(&self, source: &str) -> Option<&ItemBatch> {
        self.entries
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, batch)| batch)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemBatch)> {
        self.entries.iter().map(|(name, batch)| (name.as_str(), batch))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.entries.iter().map(|(_, b)| b.len()).sum()
    }

    pub fn into_batches(self) -> impl Iterator<Item = ItemBatch> {
        self.entries.into_iter().map(|(_, batch)| batch)
    }
}

/// Fetch and extract every source concurrently and wait for all of them.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn fetch_all<F: Fetch>(
    fetcher: &F,
    sources: &[&Source],
    fetch_timeout: Duration,
    max_items: usize,
) -> SourceBatches {
    let settled = join_all(
        sources
            .iter()
            .map(|source| fetch_one(fetcher, source, fetch_timeout, max_items)),
    )
    .await;

    let entries: Vec<(String, ItemBatch)> = sources
        .iter()
        .map(|s| s.name().to_string())
        .zip(settled)
        .collect();
    let batches = SourceBatches { entries };
    info!(
        sources = batches.len(),
        items = batches.total_items(),
        "All source fetches settled"
    );
    batches
}

async fn fetch_one<F: Fetch>(
    fetcher: &F,
    source: &Source,
    fetch_timeout: Duration,
    max_items: usize,
) -> ItemBatch {
    let url = source.descriptor.fetch_url.as_str();
    let result = match timeout(fetch_timeout, fetcher.get(url)).await {
        Ok(res) => res,
        Err(_) => Err(TransportError::timed_out(url, fetch_timeout)),
    };

    match result {
        Ok(body) => {
            let batch = extract_page(&body, source, max_items);
            if batch.is_empty() {
                debug!(
                    source = %source.name(),
                    body_preview = %truncate_for_log(&body, 200),
                    "Page yielded no items"
                );
            }
            batch
        }
        Err(e) => {
            error!(
                source = %source.name(),
                %url,
                message = %e.message,
                status = ?e.status,
                status_text = ?e.status_text,
                headers = %e.headers_for_log(),
                "Source fetch failed; using empty batch"
            );
            ItemBatch::new()
        }
    }
}
