//! Client configuration.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `environment` | Endpoint URLs, route prefix and page origin |
//! | `options` | Runtime options (greeting, timeouts, buffer sizes) |
//! | `policy` | Backoff and closure-code policy |

// ============================================================================
// Submodules
// ============================================================================

/// Endpoint URLs, route prefix and page origin.
pub mod environment;

/// Runtime options.
pub mod options;

/// Backoff and closure-code policy.
pub mod policy;

// ============================================================================
// Re-exports
// ============================================================================

pub use environment::{DEFAULT_PREFIX, Environment, Origin};
pub use options::ClientOptions;
pub use policy::{NORMAL_CLOSURE, ReconnectPolicy};
