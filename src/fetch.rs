//! Page fetching.
//!
//! The pipeline only needs "GET this URL, give me the body or tell me why
//! not". [`Fetch`] is that seam; [`HttpFetcher`] is the `reqwest` version used
//! by the binary, and tests swap in an in-memory stub.
//!
//! Retries are deliberately absent: a failed source is empty for this run and
//! gets another chance on the next one.

use crate::config::Settings;
use crate::error::TransportError;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Trait for fetching a page body.
pub trait Fetch {
    /// Fetch `url` and return the response body.
    ///
    /// Any non-success status is an error, carrying the status, its canonical
    /// reason and the response headers.
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client honoring the configured timeout and user agent.
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.fetch_timeout)
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or("<non-ascii>").to_string(),
                    )
                })
                .collect();
            warn!(%url, status = status.as_u16(), "Non-success response");
            return Err(TransportError {
                message: format!("GET {url} returned {status}"),
                status: Some(status.as_u16()),
                status_text: status.canonical_reason().map(str::to_string),
                headers,
            });
        }

        let body = response.text().await?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let status = e.status();
        TransportError {
            message: e.to_string(),
            status: status.map(|s| s.as_u16()),
            status_text: status.and_then(|s| s.canonical_reason()).map(str::to_string),
            headers: Vec::new(),
        }
    }
}
