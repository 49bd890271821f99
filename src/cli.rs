//! Command-line interface definitions.
//!
//! Every option can also be supplied through the environment variable shown.

use crate::config::{DEFAULT_MAX_ITEMS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, DEFAULT_WINDOW, Settings};
use clap::Parser;
use std::time::Duration;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # One run over the built-in sources, feed printed to stdout
/// feed_merge
///
/// # Custom sources, JSON files refreshed every 15 minutes
/// feed_merge --sources sources.yaml -o ./public --every 900
///
/// # Only one source's items
/// feed_merge --source podnews
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML file of source descriptors (built-in list when omitted)
    #[arg(short, long, env = "FEED_SOURCES")]
    pub sources: Option<String>,

    /// Output directory for JSON files (stdout when omitted)
    #[arg(short, long, env = "FEED_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Maximum items taken from each source per run
    #[arg(long, env = "FEED_MAX_ITEMS", default_value_t = DEFAULT_MAX_ITEMS)]
    pub max_items: usize,

    /// Dated items between two rounds of dateless inserts
    #[arg(long, env = "FEED_WINDOW", default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Per-source fetch timeout in seconds
    #[arg(long, env = "FEED_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Print only the items of this source
    #[arg(long, conflicts_with = "output_dir")]
    pub source: Option<String>,

    /// Re-run every SECS seconds instead of exiting after one run
    #[arg(long, value_name = "SECS")]
    pub every: Option<u64>,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            max_items_per_source: self.max_items,
            interleave_window: self.window,
            fetch_timeout: Duration::from_secs(self.timeout_secs),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
