//! The aggregation facade: the only entry point a serving layer needs.
//!
//! A run goes:
//!
//! 1. fetch and extract every dated source, wait for all of them
//! 2. merge-sort their dated items, newest first
//! 3. fetch and extract every dateless source, wait for all of them
//! 4. interleave the dateless items (plus any undated stragglers from dated
//!    sources) into the sorted sequence
//! 5. publish the result, replacing the previous feed in one swap
//!
//! Readers of [`Aggregator::latest`] and [`Aggregator::by_id`] see either the
//! previous feed or the new one, never a partial one.

use crate::config::{Settings, Source};
use crate::error::ConfigError;
use crate::fetch::Fetch;
use crate::interleave::interleave;
use crate::merge::merge_sort;
use crate::models::{AggregatedFeed, CanonicalItem, DatedItem};
use crate::orchestrator::{SourceBatches, fetch_all};
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{info, instrument};

/// Runs the pipeline and holds the most recently published feed.
#[derive(Debug)]
pub struct Aggregator<F> {
    fetcher: F,
    sources: Vec<Source>,
    settings: Settings,
    latest: RwLock<Arc<AggregatedFeed>>,
}

impl<F: Fetch> Aggregator<F> {
    /// # Errors
    ///
    /// Invalid settings or an empty source list.
    pub fn new(fetcher: F, sources: Vec<Source>, settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(Self {
            fetcher,
            sources,
            settings,
            latest: RwLock::new(Arc::new(AggregatedFeed::empty())),
        })
    }

    /// Run the pipeline once and publish the result.
    ///
    /// Never fails: sources that can't be fetched or parsed simply contribute
    /// nothing, and if every source fails the published feed is empty.
    ///
    /// With no dated items at all, the feed still carries one item from each
    /// dateless source (see [`interleave`]), not an empty list.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> Arc<AggregatedFeed> {
        let t0 = Instant::now();
        let (dated_sources, dateless_sources): (Vec<&Source>, Vec<&Source>) =
            self.sources.iter().partition(|s| s.is_dated());

        let dated_batches = self.fetch(&dated_sources).await;
        let (dated, stragglers) = split_dated(dated_batches);
        let sorted = merge_sort(dated);

        let dateless_batches = self.fetch(&dateless_sources).await;
        let mut supplies: Vec<Vec<CanonicalItem>> = dateless_batches.into_batches().collect();
        supplies.extend(stragglers);

        let dated_count = sorted.len();
        let items = interleave(
            sorted.into_iter().map(CanonicalItem::from).collect(),
            supplies,
            self.settings.interleave_window,
        );

        let feed = Arc::new(AggregatedFeed {
            generated_at: Utc::now(),
            items,
        });
        self.publish(Arc::clone(&feed));

        info!(
            dated = dated_count,
            dateless = feed.items.len() - dated_count,
            total = feed.items.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Published aggregated feed"
        );
        feed
    }

    async fn fetch(&self, sources: &[&Source]) -> SourceBatches {
        fetch_all(
            &self.fetcher,
            sources,
            self.settings.fetch_timeout,
            self.settings.max_items_per_source,
        )
        .await
    }
}

impl<F> Aggregator<F> {
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// The most recently published feed (empty before the first run).
    pub fn latest(&self) -> Arc<AggregatedFeed> {
        Arc::clone(&self.latest.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Items of the last published feed attributed to `source_id`.
    pub fn by_id(&self, source_id: &str) -> Vec<CanonicalItem> {
        self.latest().by_source(source_id)
    }

    fn publish(&self, feed: Arc<AggregatedFeed>) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = feed;
    }
}

/// Flatten dated-source batches into the merge input, in configuration
/// order, so equal dates keep the order the sources were listed in.
///
/// Items that came back without a usable date are kept per source, to be
/// interleaved like any other dateless supply.
fn split_dated(batches: SourceBatches) -> (Vec<DatedItem>, Vec<Vec<CanonicalItem>>) {
    let mut dated = Vec::new();
    let mut stragglers = Vec::new();
    for batch in batches.into_batches() {
        let mut undated = Vec::new();
        for item in batch {
            match item {
                CanonicalItem::Dated(d) => dated.push(d),
                other => undated.push(other),
            }
        }
        if !undated.is_empty() {
            stragglers.push(undated);
        }
    }
    (dated, stragglers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_sources;
    use crate::dates::normalize;
    use crate::fetch::stub::StubFetcher;
    use crate::models::{ExtractionRules, ExtractorKind, SourceDescriptor};

    fn descriptor(name: &str, date: Option<&str>) -> SourceDescriptor {
        SourceDescriptor {
            name: name.to_string(),
            fetch_url: format!("https://{name}.test/news"),
            base_url: format!("https://{name}.test"),
            kind: ExtractorKind::Listing,
            rules: ExtractionRules {
                container: "article".to_string(),
                link: Some("a".to_string()),
                title: None,
                date: date.map(str::to_string),
                date_attr: None,
            },
        }
    }

    fn aggregator(fetcher: StubFetcher, descriptors: Vec<SourceDescriptor>) -> Aggregator<StubFetcher> {
        Aggregator::new(fetcher, compile_sources(descriptors).unwrap(), Settings::default()).unwrap()
    }

    const SOURCE_A: &str = r#"
        <article><a href="/older">older story</a><time>March 1, 2024</time></article>
        <article><a href="/newer">newer story</a><time>March 3, 2024</time></article>
    "#;
    const SOURCE_C: &str = r#"<article><a href="/evergreen">evergreen guide</a></article>"#;

    fn three_sources() -> Aggregator<StubFetcher> {
        let fetcher = StubFetcher::new()
            .body("https://a.test/news", SOURCE_A)
            .fail("https://b.test/news", 502)
            .body("https://c.test/news", SOURCE_C);
        aggregator(
            fetcher,
            vec![
                descriptor("a", Some("time")),
                descriptor("b", Some("time")),
                descriptor("c", None),
            ],
        )
    }

    #[tokio::test]
    async fn test_run_orders_dated_and_inserts_dateless() {
        let agg = three_sources();
        let feed = agg.run().await;

        let urls: Vec<&str> = feed.items.iter().map(|i| i.url()).collect();
        assert_eq!(
            urls,
            vec![
                "https://c.test/evergreen",
                "https://a.test/newer",
                "https://a.test/older",
            ]
        );
        assert!(feed.items.iter().all(|i| i.source() != "b"));
        assert_eq!(feed.items[1].sort_key(), normalize("March 3, 2024").ok());
        assert_eq!(feed.items[0].title(), "Evergreen Guide");
    }

    #[tokio::test]
    async fn test_all_sources_failing_gives_empty_feed() {
        let agg = aggregator(
            StubFetcher::new(),
            vec![descriptor("a", Some("time")), descriptor("c", None)],
        );
        let feed = agg.run().await;
        assert!(feed.items.is_empty());
        assert!(agg.latest().items.is_empty());
    }

    #[tokio::test]
    async fn test_latest_is_replaced_wholesale() {
        let agg = three_sources();
        assert!(agg.latest().items.is_empty());

        let first = agg.run().await;
        assert_eq!(agg.latest(), first);

        let second = agg.run().await;
        assert_eq!(agg.latest().items, second.items);
        assert_eq!(agg.latest().items.len(), 3);
    }

    #[tokio::test]
    async fn test_by_id_filters_last_feed() {
        let agg = three_sources();
        assert!(agg.by_id("a").is_empty());

        agg.run().await;
        let a = agg.by_id("a");
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].url(), "https://a.test/newer");
        assert_eq!(agg.by_id("c").len(), 1);
        assert!(agg.by_id("b").is_empty());
        assert!(agg.by_id("nope").is_empty());
    }

    #[tokio::test]
    async fn test_ties_across_sources_keep_configuration_order() {
        let page = |slug: &str| {
            format!(r#"<article><a href="/{slug}">{slug}</a><time>May 5, 2024</time></article>"#)
        };
        let fetcher = StubFetcher::new()
            .body("https://first.test/news", &page("one"))
            .body("https://second.test/news", &page("two"));
        let agg = aggregator(
            fetcher,
            vec![descriptor("first", Some("time")), descriptor("second", Some("time"))],
        );
        let feed = agg.run().await;
        let sources: Vec<&str> = feed.items.iter().map(|i| i.source()).collect();
        assert_eq!(sources, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_undated_items_from_dated_source_are_interleaved() {
        let page = r#"
            <article><a href="/dated">dated</a><time>June 1, 2024</time></article>
            <article><a href="/nodate">no date</a></article>
            <article><a href="/baddate">bad date</a><time>sometime soon</time></article>
        "#;
        let fetcher = StubFetcher::new().body("https://a.test/news", page);
        let agg = aggregator(fetcher, vec![descriptor("a", Some("time"))]);
        let feed = agg.run().await;

        let urls: Vec<&str> = feed.items.iter().map(|i| i.url()).collect();
        assert_eq!(urls, vec!["https://a.test/nodate", "https://a.test/dated"]);
    }

    #[tokio::test]
    async fn test_link_selector_without_matches_yields_nothing() {
        let page = r#"<article><span>no anchor at all</span><time>June 1, 2024</time></article>"#;
        let fetcher = StubFetcher::new().body("https://a.test/news", page);
        let agg = aggregator(fetcher, vec![descriptor("a", Some("time"))]);
        let feed = agg.run().await;
        assert!(feed.items.is_empty());
    }

    #[tokio::test]
    async fn test_dated_items_every_window() {
        let page: String = (1..=5)
            .map(|d| {
                format!(r#"<article><a href="/d{d}">d{d}</a><time>June {d}, 2024</time></article>"#)
            })
            .collect();
        let undated: String = (1..=3)
            .map(|u| format!(r#"<article><a href="/u{u}">u{u}</a></article>"#))
            .collect();
        let fetcher = StubFetcher::new()
            .body("https://a.test/news", &page)
            .body("https://c.test/news", &undated);
        let sources = compile_sources(vec![descriptor("a", Some("time")), descriptor("c", None)])
            .unwrap();
        let settings = Settings {
            interleave_window: 2,
            ..Settings::default()
        };
        let agg = Aggregator::new(fetcher, sources, settings).unwrap();
        let feed = agg.run().await;

        let titles: Vec<&str> = feed.items.iter().map(|i| i.title()).collect();
        assert_eq!(titles, vec!["U1", "D5", "D4", "U2", "D3", "D2", "U3", "D1"]);
    }

    #[tokio::test]
    async fn test_dateless_only_run_shows_one_item_per_source() {
        let undated = |n: &str| {
            format!(r#"<article><a href="/{n}1">{n}1</a></article><article><a href="/{n}2">{n}2</a></article>"#)
        };
        let fetcher = StubFetcher::new()
            .body("https://c.test/news", &undated("c"))
            .body("https://d.test/news", &undated("d"));
        let agg = aggregator(fetcher, vec![descriptor("c", None), descriptor("d", None)]);
        let feed = agg.run().await;

        let urls: Vec<&str> = feed.items.iter().map(|i| i.url()).collect();
        assert_eq!(urls, vec!["https://c.test/c1", "https://d.test/d1"]);
    }

    #[test]
    fn test_new_rejects_bad_settings_and_empty_sources() {
        let zero = Settings {
            interleave_window: 0,
            ..Settings::default()
        };
        let sources = compile_sources(vec![descriptor("a", None)]).unwrap();
        assert!(Aggregator::new(StubFetcher::new(), sources, zero).is_err());
        assert!(matches!(
            Aggregator::new(StubFetcher::new(), vec![], Settings::default()),
            Err(ConfigError::NoSources)
        ));
    }
}
