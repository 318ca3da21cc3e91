//! Bearer token sources.
//!
//! The manager asks its [`TokenSource`] for the current token on every
//! connection attempt, so a token refreshed by the login flow is picked up by
//! the next reconnect without any extra wiring.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

// ============================================================================
// TokenSource
// ============================================================================

/// Synchronous accessor for the current bearer token.
pub trait TokenSource: Send + Sync + 'static {
    /// Returns the token, or `None` when signed out.
    ///
    /// An empty string is treated the same as `None`.
    fn token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

// ============================================================================
// NoToken
// ============================================================================

/// Source that never has a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

// ============================================================================
// StaticToken
// ============================================================================

/// Source returning a fixed token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps a token.
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

// ============================================================================
// SharedToken
// ============================================================================

/// Mutable token shared between an auth flow and the manager.
///
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    /// Creates an empty slot.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a token, e.g. after login.
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = Some(token.into());
    }

    /// Clears the token, e.g. on logout.
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Returns `true` if a non-empty token is stored.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.read().as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl TokenSource for SharedToken {
    fn token(&self) -> Option<String> {
        self.inner.read().clone()
    }
}

impl fmt::Debug for SharedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedToken")
            .field("set", &self.is_set())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads a token, normalizing empty strings to `None`.
pub(crate) fn current_token(source: &dyn TokenSource) -> Option<String> {
    source.token().filter(|token| !token.is_empty())
}

// ============================================================================
// Tests
// ============================================================================
