//! # feed_merge
//!
//! Fetches the configured sources, builds the merged feed, and either prints
//! it or writes it as JSON files.
//!
//! ```sh
//! feed_merge -o ./public --every 900
//! ```

use clap::Parser;
use feed_merge::aggregator::Aggregator;
use feed_merge::cli::Cli;
use feed_merge::config::{compile_sources, default_sources, load_sources};
use feed_merge::fetch::HttpFetcher;
use feed_merge::outputs::json;
use feed_merge::utils::ensure_writable_dir;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_merge starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Sources & settings: any problem here is fatal ----
    let descriptors = match &args.sources {
        Some(path) => load_sources(path).await?,
        None => default_sources(),
    };
    let sources = compile_sources(descriptors)?;
    let settings = args.settings();
    info!(
        sources = sources.len(),
        dated = sources.iter().filter(|s| s.is_dated()).count(),
        ?settings,
        "Configuration loaded"
    );

    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let fetcher = HttpFetcher::new(&settings)?;
    let aggregator = Aggregator::new(fetcher, sources, settings)?;

    match args.every {
        None => {
            aggregator.run().await;
            emit(&aggregator, &args).await?;
        }
        Some(secs) => {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            loop {
                ticker.tick().await;
                aggregator.run().await;
                // A failed write is retried with the next run's feed.
                if let Err(e) = emit(&aggregator, &args).await {
                    error!(error = %e, "Failed to emit feed");
                }
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}

/// Write the latest feed to the output directory, or print it to stdout.
///
/// `--source` and `--output-dir` never arrive together (clap rejects it).
async fn emit(aggregator: &Aggregator<HttpFetcher>, args: &Cli) -> Result<(), Box<dyn Error>> {
    match (&args.output_dir, &args.source) {
        (Some(dir), None) => json::write_feed(aggregator, dir).await,
        (_, Some(source)) => {
            println!("{}", serde_json::to_string_pretty(&aggregator.by_id(source))?);
            Ok(())
        }
        (None, None) => {
            println!("{}", serde_json::to_string_pretty(aggregator.latest().as_ref())?);
            Ok(())
        }
    }
}
