//! Error taxonomy for the aggregation pipeline.
//!
//! Only [`ConfigError`] is ever surfaced to the caller, and only at startup.
//! Everything else is recovered where it happens:
//!
//! | Error | Raised by | Recovery |
//! |-------|-----------|----------|
//! | [`TransportError`] | fetch / timeout | empty batch for that source |
//! | [`UnparseableDate`] | date normalizer | item becomes dateless |
//! | [`ShapeMismatch`] | extractors | the single item is skipped |

use std::time::Duration;
use thiserror::Error;

/// A fetch that failed, returned a non-success status, or timed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl TransportError {
    /// A failure with no HTTP response attached (DNS, TLS, connection reset...).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            status_text: None,
            headers: Vec::new(),
        }
    }

    pub fn timed_out(url: &str, after: Duration) -> Self {
        Self::network(format!("request to {url} timed out after {after:?}"))
    }

    /// Compact `name: value; ...` rendering for log fields.
    pub fn headers_for_log(&self) -> String {
        self.headers
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Date text that does not resolve to a real calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable date: {input:?}")]
pub struct UnparseableDate {
    pub input: String,
}

/// An expected node or attribute was absent for one item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeMismatch {
    #[error("no node matched link selector `{0}`")]
    MissingLink(String),
    #[error("link element has no href")]
    MissingHref,
    #[error("item has an empty title")]
    EmptyTitle,
    #[error("cannot resolve `{href}` against `{base}`")]
    BadUrl { href: String, base: String },
}

/// Malformed source configuration. Fatal, and only raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no sources configured")]
    NoSources,
    #[error("source name `{0}` is used more than once")]
    DuplicateName(String),
    #[error("source names `{first}` and `{second}` both map to output file `{slug}`")]
    SlugCollision {
        first: String,
        second: String,
        slug: String,
    },
    #[error("source name `{0}` has no usable characters for a file name")]
    UnusableName(String),
    #[error("source `{source_name}`: invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        source_name: String,
        selector: String,
        reason: String,
    },
    #[error("source `{source_name}`: invalid {field} `{value}`: {reason}")]
    InvalidUrl {
        source_name: String,
        field: &'static str,
        value: String,
        reason: url::ParseError,
    },
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("reading {path}: {err}")]
    Io {
        path: String,
        #[source]
        err: std::io::Error,
    },
    #[error("parsing {path}: {err}")]
    Yaml {
        path: String,
        #[source]
        err: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_headers_for_log() {
        let err = TransportError {
            message: "HTTP 503".to_string(),
            status: Some(503),
            status_text: Some("Service Unavailable".to_string()),
            headers: vec![
                ("retry-after".to_string(), "120".to_string()),
                ("server".to_string(), "nginx".to_string()),
            ],
        };
        assert_eq!(err.headers_for_log(), "retry-after: 120; server: nginx");
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[test]
    fn test_timed_out_has_no_status() {
        let err = TransportError::timed_out("https://example.com", Duration::from_secs(3));
        assert!(err.status.is_none());
        assert!(err.message.contains("timed out"));
        assert!(err.message.contains("https://example.com"));
    }
}
