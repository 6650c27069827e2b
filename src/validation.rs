//! Resource URL validation
//!
//! Only single watch-style references are accepted:
//! `http(s)://{www.,m.,music.}youtube.com/watch?v=<11-char id>`.
//! Validation runs before the provider is ever invoked.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

const ALLOWED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

#[allow(clippy::expect_used)]
fn resource_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static pattern compiles"))
}

/// Check that `raw` names a single supported resource
///
/// Returns the parsed URL on success.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first rule the URL breaks.
pub fn validate_resource_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Validation("url must not be empty".into()));
    }

    let url = Url::parse(raw).map_err(|e| Error::Validation(format!("malformed url: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Validation(format!(
            "unsupported url scheme '{}'",
            url.scheme()
        )));
    }

    // url normalizes hosts to lowercase
    let host = url.host_str().unwrap_or_default();
    if !ALLOWED_HOSTS.contains(&host) {
        return Err(Error::Validation(format!("unsupported host '{host}'")));
    }

    if url.path() != "/watch" {
        return Err(Error::Validation(format!(
            "unsupported path '{}', expected /watch",
            url.path()
        )));
    }

    let id = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| Error::Validation("missing 'v' query parameter".into()))?;

    if !resource_id_pattern().is_match(&id) {
        return Err(Error::Validation(format!("invalid resource id '{id}'")));
    }

    Ok(url)
}
