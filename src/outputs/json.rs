//! JSON output of the published feed.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── feed.json          # the whole AggregatedFeed
//! └── sources/
//!     ├── pod_mvmt.json  # by_id("pod_mvmt")
//!     ├── mashable.json
//!     └── podnews.json
//! ```
//!
//! Each file is written to a temporary name first and then renamed, so a
//! reader polling the directory never sees a half-written file.

use crate::aggregator::Aggregator;
use crate::utils::slugify;
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write the aggregator's latest feed and one file per configured source.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_feed<F>(
    aggregator: &Aggregator<F>,
    json_output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let dir = json_output_dir.trim_end_matches('/');
    let feed = aggregator.latest();

    write_json(&format!("{dir}/feed.json"), feed.as_ref()).await?;

    let sources_dir = format!("{dir}/sources");
    if let Err(e) = fs::create_dir_all(&sources_dir).await {
        error!(%sources_dir, error = %e, "Failed to create sources dir");
        return Err(e.into());
    }
    for source in aggregator.sources() {
        let items = aggregator.by_id(source.name());
        let path = format!("{sources_dir}/{}.json", slugify(source.name()));
        write_json(&path, &items).await?;
    }

    info!(
        items = feed.items.len(),
        sources = aggregator.sources().len(),
        "Wrote JSON feed files"
    );
    Ok(())
}

async fn write_json<T: Serialize + ?Sized>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = format!("{path}.tmp");
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await?;
    info!(%path, "Wrote JSON file");
    Ok(())
}
