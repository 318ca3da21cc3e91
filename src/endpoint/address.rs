//! Endpoint URL assembly.
//!
//! Builds `<base>/<cleaned path>?token=<encoded token>`. The token rides in
//! the query string because browser-compatible socket handshakes cannot carry
//! an `Authorization` header; a reverse proxy in front of the backend lifts
//! it into `Authorization: Bearer <token>` and strips the query before
//! forwarding. The token must therefore be the only query parameter.

// ============================================================================
// Imports
// ============================================================================

use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Query parameter carrying the bearer token.
pub const TOKEN_PARAM: &str = "token";

/// Replacement for the token value in logged URLs.
const REDACTED: &str = "***";

// ============================================================================
// PathCleaner
// ============================================================================

/// Normalizes caller paths against the route prefix.
///
/// `"/ws/notifications"`, `"ws//notifications"` and `"notifications"` all
/// clean to `"notifications"` for the prefix `ws`.
#[derive(Debug, Clone)]
pub struct PathCleaner {
    /// Matches a leading `<prefix>` followed by slashes or end of input.
    leading_prefix: Option<Regex>,
}

impl PathCleaner {
    /// Creates a cleaner for the given route prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the prefix cannot be compiled into a pattern.
    pub fn new(prefix: &str) -> Result<Self> {
        let prefix = prefix.trim_matches('/');

        let leading_prefix = if prefix.is_empty() {
            None
        } else {
            let pattern = format!("(?i)^{}(?:/+|$)", regex::escape(prefix));
            Some(Regex::new(&pattern).map_err(|e| Error::config(e.to_string()))?)
        };

        Ok(Self { leading_prefix })
    }

    /// Strips leading slashes and one leading prefix segment.
    #[must_use]
    pub fn clean<'a>(&self, path: &'a str) -> &'a str {
        let path = path.trim_start_matches('/');

        match &self.leading_prefix {
            Some(pattern) => match pattern.find(path) {
                Some(found) => &path[found.end()..],
                None => path,
            },
            None => path,
        }
    }
}

// ============================================================================
// URL Helpers
// ============================================================================

/// Joins `base` and `path` with exactly one slash.
///
/// An empty `path` yields `base` without a trailing slash.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Percent-encodes a query value the way `encodeURIComponent` does.
///
/// Unreserved characters `A-Z a-z 0-9 - _ . ! ~ * ' ( )` stay literal,
/// everything else is encoded as UTF-8 bytes.
#[must_use]
pub fn encode_component(value: &str) -> String {
    // urlencoding keeps only [A-Za-z0-9-_.~] literal
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// Builds the final connection URL.
///
/// The token is appended only when present and non-empty.
///
/// # Errors
///
/// Returns [`Error::Url`] if the assembled string is not a valid URL.
pub fn build_url(base: &str, cleaned_path: &str, token: Option<&str>) -> Result<Url> {
    let endpoint = join_url(base, cleaned_path);

    let raw = match token.filter(|t| !t.is_empty()) {
        Some(token) => format!("{endpoint}?{TOKEN_PARAM}={}", encode_component(token)),
        None => endpoint,
    };

    Url::parse(&raw).map_err(|e| Error::url(redact_str(&raw), e))
}

/// Renders a URL with its token value replaced, for logging.
#[must_use]
pub fn redact(url: &Url) -> String {
    redact_str(url.as_str())
}

fn redact_str(raw: &str) -> String {
    match raw.split_once('?') {
        Some((endpoint, query)) => {
            let query = query
                .split('&')
                .map(|pair| match pair.split_once('=') {
                    Some((TOKEN_PARAM, _)) => format!("{TOKEN_PARAM}={REDACTED}"),
                    _ => pair.to_string(),
                })
                .collect::<Vec<_>>()
                .join("&");
            format!("{endpoint}?{query}")
        }
        None => raw.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
