//! Socket base URL resolution.
//!
//! Resolution runs on every `connect()` and is never cached, since the
//! origin or environment may change between calls.
//!
//! # Resolution Order
//!
//! | Step | Condition | Base |
//! |------|-----------|------|
//! | 1 | `ws_url` is `ws://` / `wss://` | `ws_url` verbatim |
//! | 2 | `ws_url` starts with `/` | `<origin scheme>://<origin host><ws_url>` |
//! | 3 | `api_url` is `http://` / `https://` | `api_url` with `ws(s)` scheme + `/<prefix>` |
//! | 4 | otherwise | `<origin scheme>://<origin host>/<prefix>` |
//!
//! Trailing slashes are trimmed from every result.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::config::{DEFAULT_PREFIX, Environment, Origin};
use crate::error::{Error, Result};

use super::address::join_url;

// ============================================================================
// BaseResolver
// ============================================================================

/// Produces the socket base URL a logical path is joined onto.
pub trait BaseResolver: Send + Sync + 'static {
    /// Returns the scheme-correct base URL, without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base cannot be determined.
    fn resolve_base(&self) -> Result<String>;

    /// Route prefix stripped from caller paths.
    fn prefix(&self) -> &str {
        DEFAULT_PREFIX
    }
}

impl BaseResolver for Environment {
    fn resolve_base(&self) -> Result<String> {
        if let Some(ws_url) = non_empty(self.ws_url.as_deref()) {
            if split_scheme(ws_url).is_some_and(|(scheme, _)| matches!(scheme.as_str(), "ws" | "wss")) {
                return Ok(trim_trailing(ws_url).to_string());
            }

            if ws_url.starts_with('/') {
                let origin = require_origin(self.origin.as_ref())?;
                let base = format!("{}://{}{}", origin.ws_scheme(), origin.host(), ws_url);
                return Ok(trim_trailing(&base).to_string());
            }

            debug!(ws_url, "Ignoring socket URL that is neither absolute nor a path");
        }

        if let Some(api_url) = non_empty(self.api_url.as_deref())
            && let Some((scheme, rest)) = split_scheme(api_url)
        {
            let ws_scheme = match scheme.as_str() {
                "http" => Some("ws"),
                "https" => Some("wss"),
                _ => None,
            };

            if let Some(ws_scheme) = ws_scheme {
                let base = format!("{ws_scheme}://{}", trim_trailing(rest));
                return Ok(join_url(&base, &self.prefix));
            }
        }

        let origin = require_origin(self.origin.as_ref())?;
        let base = format!("{}://{}", origin.ws_scheme(), origin.host());
        Ok(join_url(&base, &self.prefix))
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Splits `scheme://rest`, lowercasing the scheme.
fn split_scheme(url: &str) -> Option<(String, &str)> {
    let (scheme, rest) = url.split_once("://")?;

    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    Some((scheme.to_ascii_lowercase(), rest))
}

fn trim_trailing(url: &str) -> &str {
    url.trim_end_matches('/')
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn require_origin(origin: Option<&Origin>) -> Result<&Origin> {
    origin.ok_or_else(|| {
        Error::config(
            "Cannot resolve the socket URL: configure an absolute ws_url or api_url, \
             or provide the page origin",
        )
    })
}

// ============================================================================
// Tests
// ============================================================================
