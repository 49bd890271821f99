//! Output writers for the published feed.
//!
//! - [`json`]: `feed.json` plus one file per source, for static hosting or
//!   for a serving layer that reads from disk

pub mod json;
