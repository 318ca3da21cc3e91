//! Notification client.
//!
//! [`ConnectionManager`] is the entry point: build one with
//! [`ConnectionManager::builder()`], call `connect()` once, and read the
//! returned [`MessageStream`] and the [`StatusStream`] for as long as the
//! session lives. Reconnection never leaks into either stream.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `manager` | Connection manager and generation bookkeeping |
//! | `builder` | Validated construction |
//! | `status` | Status enum and replaying status stream |
//! | `stream` | Multicast message stream |
//! | `backoff` | Exponential backoff state |

// ============================================================================
// Submodules
// ============================================================================

/// Exponential backoff state.
pub mod backoff;

/// Builder for client configuration.
pub mod builder;

/// Connection manager.
pub mod manager;

/// Connection status.
pub mod status;

/// Inbound message stream.
pub mod stream;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::Backoff;
pub use builder::ClientBuilder;
pub use manager::ConnectionManager;
pub use status::{ConnectionStatus, StatusStream};
pub use stream::MessageStream;
