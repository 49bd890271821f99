//! # feed_merge
//!
//! Aggregates article listings from several sites into one feed: newest
//! dated items first, with items that carry no usable date interleaved at a
//! fixed cadence.
//!
//! ## Architecture
//!
//! 1. **Fetching** ([`orchestrator`], [`fetch`]): one GET per source, all
//!    concurrent, each bounded by a timeout; failures become empty batches
//! 2. **Extraction** ([`scrapers`]): selector-driven, per source, into
//!    [`models::CanonicalItem`]s, with dates run through [`dates::normalize`]
//! 3. **Ordering** ([`merge`]): stable merge sort of dated items, newest first
//! 4. **Interleaving** ([`interleave`]): dateless items placed every N dated ones
//! 5. **Publishing** ([`aggregator`]): the finished feed replaces the previous one
//!
//! ## Usage
//!
//! ```ignore
//! let sources = config::compile_sources(config::default_sources())?;
//! let settings = config::Settings::default();
//! let fetcher = fetch::HttpFetcher::new(&settings)?;
//! let aggregator = aggregator::Aggregator::new(fetcher, sources, settings)?;
//! let feed = aggregator.run().await;
//! let podnews_only = aggregator.by_id("podnews");
//! ```

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod interleave;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod outputs;
pub mod scrapers;
pub mod utils;

pub use aggregator::Aggregator;
pub use error::{ConfigError, ShapeMismatch, TransportError, UnparseableDate};
pub use models::{AggregatedFeed, CanonicalItem, DatedItem, ItemBatch, SourceDescriptor, UndatedItem};
