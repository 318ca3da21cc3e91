//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating
//! [`ConnectionManager`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use realtime_notify::{ConnectionManager, Environment, ReconnectPolicy};
//!
//! # fn example() -> realtime_notify::Result<()> {
//! let manager = ConnectionManager::builder()
//!     .environment(Environment::new().with_api_url("https://api.example.com"))
//!     .token("secret")
//!     .policy(ReconnectPolicy::new().with_ceiling(Duration::from_secs(30)))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::auth::{NoToken, StaticToken, TokenSource};
use crate::config::{ClientOptions, Environment, ReconnectPolicy};
use crate::endpoint::{BaseResolver, Endpoint};
use crate::error::{Error, Result};
use crate::transport::{Connector, TungsteniteConnector};

use super::manager::ConnectionManager;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`ConnectionManager`].
///
/// Use [`ConnectionManager::builder()`] to create a new builder.
#[derive(Default)]
pub struct ClientBuilder {
    /// Environment, validated eagerly on build.
    environment: Option<Environment>,
    /// Custom resolver, trusted as-is.
    resolver: Option<Arc<dyn BaseResolver>>,
    tokens: Option<Arc<dyn TokenSource>>,
    connector: Option<Arc<dyn Connector>>,
    policy: ReconnectPolicy,
    options: ClientOptions,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default policy and options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the base URL from environment configuration.
    ///
    /// Replaces any resolver set earlier.
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self.resolver = None;
        self
    }

    /// Resolves the base URL with a custom resolver.
    ///
    /// The resolver runs on every attempt, so it can follow a changing
    /// origin. Replaces any environment set earlier.
    #[must_use]
    pub fn resolver(mut self, resolver: impl BaseResolver) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self.environment = None;
        self
    }

    /// Sets where the bearer token comes from.
    ///
    /// The source is consulted on every attempt. Defaults to no token.
    #[must_use]
    pub fn token_source(mut self, source: impl TokenSource) -> Self {
        self.tokens = Some(Arc::new(source));
        self
    }

    /// Uses a fixed bearer token.
    #[must_use]
    pub fn token(self, token: impl Into<String>) -> Self {
        self.token_source(StaticToken::new(token))
    }

    /// Replaces the socket connector.
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets runtime options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the manager with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no environment or resolver is set
    /// - [`Error::Config`] if the policy or options are invalid
    /// - [`Error::Config`] if the environment cannot resolve a base
    /// - [`Error::Url`] if the resolved base is not a valid URL
    pub fn build(self) -> Result<ConnectionManager> {
        self.policy.validate()?;
        self.options.validate()?;

        let resolver = self.validate_resolver()?;
        let endpoint = Endpoint::new(resolver)?;

        let tokens = self.tokens.unwrap_or_else(|| Arc::new(NoToken));
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(TungsteniteConnector));

        Ok(ConnectionManager::from_parts(
            endpoint,
            tokens,
            connector,
            self.policy,
            self.options,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Picks the resolver, checking an environment up front.
    fn validate_resolver(&self) -> Result<Arc<dyn BaseResolver>> {
        if let Some(resolver) = &self.resolver {
            return Ok(Arc::clone(resolver));
        }

        let environment = self.environment.clone().ok_or_else(|| {
            Error::config(
                "No endpoint configured. Use .environment() or .resolver() to set one.\n\
                 Example: ConnectionManager::builder().environment(Environment::from_env()?)",
            )
        })?;

        let base = environment.resolve_base()?;
        Url::parse(&base).map_err(|e| Error::url(base, e))?;

        Ok(Arc::new(environment))
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("environment", &self.environment)
            .field("has_resolver", &self.resolver.is_some())
            .field("has_token_source", &self.tokens.is_some())
            .field("policy", &self.policy)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::config::Origin;

    #[test]
    fn test_build_requires_endpoint() {
        let err = ClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_with_absolute_ws_url() {
        let manager = ClientBuilder::new()
            .environment(Environment::new().with_ws_url("wss://host/ws"))
            .token("abc")
            .build();
        assert!(manager.is_ok());
    }

    #[test]
    fn test_build_rejects_bad_policy() {
        let err = ClientBuilder::new()
            .environment(Environment::new().with_ws_url("wss://host/ws"))
            .policy(ReconnectPolicy::new().with_floor(Duration::ZERO))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_rejects_unresolvable_environment() {
        // Relative ws url and no origin to anchor it
        let err = ClientBuilder::new()
            .environment(Environment::new().with_ws_url("/ws"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_with_origin_fallback() {
        let environment = Environment::new().with_origin(Origin::new("localhost:4200", false));
        assert!(ClientBuilder::new().environment(environment).build().is_ok());
    }

    #[test]
    fn test_custom_resolver_is_not_checked_eagerly() {
        struct Later;

        impl BaseResolver for Later {
            fn resolve_base(&self) -> Result<String> {
                Err(Error::config("origin not known yet"))
            }
        }

        assert!(ClientBuilder::new().resolver(Later).build().is_ok());
    }

    #[test]
    fn test_debug_hides_token() {
        let builder = ClientBuilder::new().token("super-secret");
        assert!(!format!("{builder:?}").contains("super-secret"));
    }
}
