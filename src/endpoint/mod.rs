//! Connection URL resolution.
//!
//! Turns a logical path such as `"notifications"` into the full socket URL:
//!
//! ```text
//! Environment + Origin ──► BaseResolver ──► wss://host/ws
//! "ws/notifications"   ──► PathCleaner  ──► notifications
//! TokenSource          ──► encode       ──► ?token=a%20b
//!                                           │
//!                          wss://host/ws/notifications?token=a%20b
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `address` | Path cleaning, URL join, token encoding, redaction |
//! | `resolver` | Base URL resolution from environment and origin |

// ============================================================================
// Submodules
// ============================================================================

/// Path cleaning, URL join, token encoding, redaction.
pub mod address;

/// Base URL resolution.
pub mod resolver;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Re-exports
// ============================================================================

pub use address::{PathCleaner, TOKEN_PARAM, build_url, encode_component, join_url, redact};
pub use resolver::BaseResolver;

// ============================================================================
// Endpoint
// ============================================================================

/// Resolver plus path cleaner, evaluated fresh for every connection attempt.
#[derive(Clone)]
pub struct Endpoint {
    resolver: Arc<dyn BaseResolver>,
    cleaner: PathCleaner,
}

impl Endpoint {
    /// Creates an endpoint from a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the resolver's prefix is unusable.
    pub fn new(resolver: Arc<dyn BaseResolver>) -> Result<Self> {
        let cleaner = PathCleaner::new(resolver.prefix())?;
        Ok(Self { resolver, cleaner })
    }

    /// Builds the connection URL for `path` with an optional token.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the base cannot be resolved
    /// - [`Error::Url`] if the result is not a valid URL
    pub fn url_for(&self, path: &str, token: Option<&str>) -> Result<Url> {
        let base = self.resolver.resolve_base()?;
        build_url(&base, self.cleaner.clean(path), token)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("prefix", &self.resolver.prefix())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Path Validation
// ============================================================================

/// Rejects paths that cannot name a route.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the path contains a query or
/// fragment marker, whitespace, or control characters.
pub fn validate_path(path: &str) -> Result<()> {
    if let Some(bad) = path
        .chars()
        .find(|c| matches!(c, '?' | '#') || c.is_whitespace() || c.is_control())
    {
        return Err(Error::invalid_argument(format!(
            "Endpoint path {path:?} contains forbidden character {bad:?}"
        )));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
