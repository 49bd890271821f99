//! Runtime settings and source descriptor loading.
//!
//! Descriptors come either from the built-in list ([`default_sources`]) or a
//! YAML file ([`load_sources`]). Both go through [`compile_sources`], which
//! validates the whole list and parses every selector once. A bad list is a
//! startup failure; nothing here runs per aggregation.
//!
//! # YAML format
//!
//! ```yaml
//! - name: podnews
//!   fetch_url: https://podnews.net/archive
//!   base_url: https://podnews.net
//!   kind: day_headings
//!   rules:
//!     container: "main li"
//!     link: "a"
//!     date: "h2, h3"
//! ```

use crate::error::ConfigError;
use crate::models::{ExtractionRules, ExtractorKind, SourceDescriptor};
use crate::utils::slugify;
use itertools::Itertools;
use scraper::Selector;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_MAX_ITEMS: usize = 5;
pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("feed_merge/", env!("CARGO_PKG_VERSION"));

/// Knobs for one aggregator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// First N containers per source per run, in document order.
    pub max_items_per_source: usize,
    /// Dated items emitted between two rounds of dateless inserts.
    pub interleave_window: usize,
    /// Upper bound on a single source fetch; expiry counts as a transport failure.
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_items_per_source: DEFAULT_MAX_ITEMS,
            interleave_window: DEFAULT_WINDOW,
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items_per_source == 0 {
            return Err(ConfigError::Zero("max items per source"));
        }
        if self.interleave_window == 0 {
            return Err(ConfigError::Zero("interleave window"));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Zero("fetch timeout"));
        }
        Ok(())
    }
}

/// Selectors parsed once at startup.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub container: Selector,
    pub link: Option<Selector>,
    pub title: Option<Selector>,
    pub date: Option<Selector>,
    pub date_attr: Option<String>,
}

/// A validated descriptor paired with its compiled selectors.
#[derive(Debug, Clone)]
pub struct Source {
    pub descriptor: SourceDescriptor,
    pub rules: CompiledRules,
}

impl Source {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn is_dated(&self) -> bool {
        self.descriptor.is_dated()
    }
}

/// The built-in source list.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            name: "pod_mvmt".to_string(),
            fetch_url: "https://podcastmovement.com/category/resources/society-culture-advocacy/"
                .to_string(),
            base_url: "https://podcastmovement.com/resources/society-culture-advocacy/"
                .to_string(),
            kind: ExtractorKind::Listing,
            rules: ExtractionRules {
                container: "article".to_string(),
                link: Some("h2.post-item-title a".to_string()),
                title: None,
                date: Some("time".to_string()),
                date_attr: Some("datetime".to_string()),
            },
        },
        SourceDescriptor {
            name: "mashable".to_string(),
            fetch_url: "https://mashable.com/category/podcasts".to_string(),
            base_url: "https://mashable.com".to_string(),
            kind: ExtractorKind::Listing,
            rules: ExtractionRules {
                container: "a[data-ga-item='title']".to_string(),
                link: None,
                title: None,
                date: None,
                date_attr: None,
            },
        },
        SourceDescriptor {
            name: "podnews".to_string(),
            fetch_url: "https://podnews.net/archive".to_string(),
            base_url: "https://podnews.net".to_string(),
            kind: ExtractorKind::DayHeadings,
            rules: ExtractionRules {
                container: "main article li".to_string(),
                link: Some("a".to_string()),
                title: None,
                date: Some("h2, h3".to_string()),
                date_attr: None,
            },
        },
    ]
}

/// Read a YAML list of descriptors from `path`.
#[instrument(level = "info")]
pub async fn load_sources(path: &str) -> Result<Vec<SourceDescriptor>, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ConfigError::Io {
            path: path.to_string(),
            err,
        })?;
    let sources: Vec<SourceDescriptor> =
        serde_yaml::from_str(&text).map_err(|err| ConfigError::Yaml {
            path: path.to_string(),
            err,
        })?;
    info!(count = sources.len(), "Loaded source descriptors");
    Ok(sources)
}

/// Validate the descriptor list and compile every selector.
///
/// # Errors
///
/// Fails on an empty list, a repeated name, names that share an output file
/// name, a relative or malformed `fetch_url`/`base_url`, or any selector that
/// does not parse.
pub fn compile_sources(descriptors: Vec<SourceDescriptor>) -> Result<Vec<Source>, ConfigError> {
    if descriptors.is_empty() {
        return Err(ConfigError::NoSources);
    }
    if let Some(name) = descriptors.iter().map(|d| d.name.as_str()).duplicates().next() {
        return Err(ConfigError::DuplicateName(name.to_string()));
    }
    check_slugs(&descriptors)?;
    descriptors.into_iter().map(compile_source).collect()
}

/// Every source gets its own `sources/<slug>.json`, so slugs must be
/// non-empty and distinct.
fn check_slugs(descriptors: &[SourceDescriptor]) -> Result<(), ConfigError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for d in descriptors {
        let slug = slugify(&d.name);
        if slug.is_empty() {
            return Err(ConfigError::UnusableName(d.name.clone()));
        }
        if let Some(first) = seen.insert(slug.clone(), d.name.as_str()) {
            return Err(ConfigError::SlugCollision {
                first: first.to_string(),
                second: d.name.clone(),
                slug,
            });
        }
    }
    Ok(())
}

fn compile_source(descriptor: SourceDescriptor) -> Result<Source, ConfigError> {
    check_url(&descriptor.name, "fetch_url", &descriptor.fetch_url)?;
    check_url(&descriptor.name, "base_url", &descriptor.base_url)?;

    let name = descriptor.name.as_str();
    let r = &descriptor.rules;
    let rules = CompiledRules {
        container: selector(name, &r.container)?,
        link: r.link.as_deref().map(|s| selector(name, s)).transpose()?,
        title: r.title.as_deref().map(|s| selector(name, s)).transpose()?,
        date: r.date.as_deref().map(|s| selector(name, s)).transpose()?,
        date_attr: r.date_attr.clone(),
    };
    Ok(Source { descriptor, rules })
}

fn check_url(source_name: &str, field: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|reason| ConfigError::InvalidUrl {
            source_name: source_name.to_string(),
            field,
            value: value.to_string(),
            reason,
        })
}

fn selector(source_name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        source_name: source_name.to_string(),
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })
}
