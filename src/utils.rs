//! Utility functions for title casing, URL resolution, string handling and
//! output directory checks.

use std::error::Error;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

/// Title-case a headline.
///
/// Upper-cases the first letter of every whitespace-separated word, leaves
/// the rest of each word untouched (so "NASA" survives), trims,
/// and collapses runs of whitespace.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(capitalize("  the best   podcasts of 2024 "), "The Best Podcasts Of 2024");
/// ```
pub fn capitalize(text: &str) -> String {
    text.split_whitespace()
        .map(upcase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalize the first character of a string.
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Turn an `href` into an absolute URL.
///
/// Anything starting with `http` is taken as already absolute. Everything
/// else is appended to `base`, with exactly one `/` between them. The result
/// must parse as a URL.
///
/// Returns `None` for an empty `href` or an unparseable result.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http") {
        return Url::parse(href).ok().map(String::from);
    }
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        href.trim_start_matches('/')
    );
    Url::parse(&joined).ok().map(String::from)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes, with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a source name to a filesystem-friendly slug.
///
/// ```ignore
/// assert_eq!(slugify("Pod Mvmt!"), "pod-mvmt");
/// ```
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-' && c != '_', "")
        .replace(' ', "-")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    fs::write(&probe_path, b"").await?;
    if let Err(e) = fs::remove_file(&probe_path).await {
        warn!(probe = %probe_path, error = %e, "Could not remove write probe");
    }
    info!("Output directory is writable");
    Ok(())
}
