//! Deployment environment and page origin.
//!
//! The [`Environment`] mirrors what a dashboard ships in its environment
//! file: an optional socket URL, an optional REST API URL, and the fixed path
//! prefix the backend mounts its socket routes under. The [`Origin`] is the
//! page the client runs on and is used when neither URL is absolute.
//!
//! # Example
//!
//! ```ignore
//! use realtime_notify::{Environment, Origin};
//!
//! let env = Environment::new()
//!     .with_api_url("https://api.example.com/api")
//!     .with_origin(Origin::parse("https://dash.example.com")?);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default path prefix of the socket routes.
pub const DEFAULT_PREFIX: &str = "ws";

/// Variable holding the socket URL (absolute `ws(s)://` or a `/path`).
pub const WS_URL_VAR: &str = "REALTIME_WS_URL";

/// Variable holding the REST API URL.
pub const API_URL_VAR: &str = "REALTIME_API_URL";

/// Variable holding the page origin.
pub const ORIGIN_VAR: &str = "REALTIME_PAGE_ORIGIN";

/// Variable overriding the socket route prefix.
pub const PREFIX_VAR: &str = "REALTIME_WS_PREFIX";

// ============================================================================
// Origin
// ============================================================================

/// Origin of the page hosting the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin {
    /// `true` when the page is served over `https`.
    secure: bool,
    /// Host with optional port, e.g. `dash.example.com:8443`.
    host: String,
}

impl Origin {
    /// Creates an origin from its parts.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            secure,
            host: host.into(),
        }
    }

    /// Parses an origin from an `http://` or `https://` URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the input is not a URL
    /// - [`Error::Config`] if the scheme is not http(s) or the host is missing
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|e| Error::url(input, e))?;

        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(Error::config(format!(
                    "Page origin must be http or https, got '{other}'"
                )));
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("Page origin has no host: {input}")))?;

        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self { secure, host })
    }

    /// Returns `true` for `https` origins.
    #[inline]
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Returns the host (with port, if any).
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the socket scheme matching this origin.
    #[inline]
    #[must_use]
    pub const fn ws_scheme(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "https" } else { "http" };
        write!(f, "{scheme}://{}", self.host)
    }
}

impl TryFrom<String> for Origin {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.to_string()
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Endpoint configuration used to resolve the socket base URL.
///
/// Loadable from JSON (`wsUrl`, `apiUrl`, `prefix`, `origin`) or from
/// process environment variables via [`Environment::from_env`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Environment {
    /// Socket URL: absolute `ws(s)://...` or a path like `/ws`.
    pub ws_url: Option<String>,

    /// REST API URL, used to derive the socket URL when `ws_url` is unset.
    pub api_url: Option<String>,

    /// Socket route prefix (without slashes).
    pub prefix: String,

    /// Page origin, required when no absolute URL is configured.
    pub origin: Option<Origin>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            ws_url: None,
            api_url: None,
            prefix: DEFAULT_PREFIX.to_string(),
            origin: None,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Environment {
    /// Creates an empty environment with the default prefix.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the environment from `REALTIME_*` process variables.
    ///
    /// Unset or empty variables leave the field at its default.
    ///
    /// # Errors
    ///
    /// Returns an error if `REALTIME_PAGE_ORIGIN` is set but invalid.
    pub fn from_env() -> Result<Self> {
        let mut environment = Self {
            ws_url: non_empty_var(WS_URL_VAR),
            api_url: non_empty_var(API_URL_VAR),
            ..Self::default()
        };

        if let Some(prefix) = non_empty_var(PREFIX_VAR) {
            environment = environment.with_prefix(prefix);
        }

        if let Some(origin) = non_empty_var(ORIGIN_VAR) {
            environment.origin = Some(Origin::parse(&origin)?);
        }

        Ok(environment)
    }

    /// Parses the environment from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Environment {
    /// Sets the socket URL.
    #[inline]
    #[must_use]
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Sets the REST API URL.
    #[inline]
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the socket route prefix. Surrounding slashes are dropped.
    #[inline]
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.prefix = prefix.as_ref().trim_matches('/').to_string();
        self
    }

    /// Sets the page origin.
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_parse_https() {
        let origin = Origin::parse("https://dash.example.com").expect("valid origin");
        assert!(origin.is_secure());
        assert_eq!(origin.host(), "dash.example.com");
        assert_eq!(origin.ws_scheme(), "wss");
    }

    #[test]
    fn test_origin_parse_keeps_port() {
        let origin = Origin::parse("http://localhost:4200/some/page").expect("valid origin");
        assert!(!origin.is_secure());
        assert_eq!(origin.host(), "localhost:4200");
        assert_eq!(origin.ws_scheme(), "ws");
        assert_eq!(origin.to_string(), "http://localhost:4200");
    }

    #[test]
    fn test_origin_rejects_other_schemes() {
        let err = Origin::parse("ftp://files.example.com").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_origin_rejects_garbage() {
        let err = Origin::parse("not a url").unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn test_default_environment() {
        let env = Environment::default();
        assert!(env.ws_url.is_none());
        assert!(env.api_url.is_none());
        assert!(env.origin.is_none());
        assert_eq!(env.prefix, DEFAULT_PREFIX);
    }

    #[test]
    fn test_with_prefix_trims_slashes() {
        let env = Environment::new().with_prefix("/realtime/");
        assert_eq!(env.prefix, "realtime");
    }

    #[test]
    fn test_from_json() {
        let env = Environment::from_json(
            r#"{"apiUrl":"http://localhost:8000/api","wsUrl":"ws://localhost:8000/ws","origin":"http://localhost:4200"}"#,
        )
        .expect("valid json");

        assert_eq!(env.api_url.as_deref(), Some("http://localhost:8000/api"));
        assert_eq!(env.ws_url.as_deref(), Some("ws://localhost:8000/ws"));
        assert_eq!(env.prefix, DEFAULT_PREFIX);
        assert_eq!(env.origin, Some(Origin::new("localhost:4200", false)));
    }

    #[test]
    fn test_from_json_rejects_bad_origin() {
        let result = Environment::from_json(r#"{"origin":"mailto:x@example.com"}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
