//! Realtime Notify - self-healing WebSocket notification client.
//!
//! This library keeps a best-effort live socket to a notification endpoint
//! and hides every disconnect from its consumers. Callers subscribe once to
//! a message stream and a status stream; the client reconnects with
//! exponential backoff behind them.
//!
//! # Architecture
//!
//! - **Connection manager**: owns the current generation, the status cell
//!   and the message broadcast
//! - **Event loop**: one task per `connect()`, driving handshake, frames,
//!   close and backoff sleep
//! - **Endpoint**: resolves the `ws`/`wss` base from configuration and
//!   carries the bearer token as a `token` query parameter
//!
//! Key design principles:
//!
//! - At most one live socket; a superseded generation can never touch state
//! - Outbound frames are never queued while disconnected
//! - Transport errors become status transitions, never stream errors
//!
//! # Quick Start
//!
//! ```no_run
//! use realtime_notify::{ConnectionManager, Environment, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = ConnectionManager::builder()
//!         .environment(Environment::new().with_ws_url("wss://api.example.com/ws"))
//!         .token("bearer-token")
//!         .build()?;
//!
//!     let mut status = manager.subscribe_status();
//!     let mut messages = manager.connect("notifications")?;
//!
//!     tokio::spawn(async move {
//!         while let Some(status) = status.recv().await {
//!             println!("status: {status}");
//!         }
//!     });
//!
//!     while let Some(message) = messages.recv().await {
//!         if let Some(notification) = message.notification() {
//!             println!("{notification:?}");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`auth`] | Token sources |
//! | [`client`] | [`ConnectionManager`], status and message streams |
//! | [`config`] | Environment, reconnect policy, runtime options |
//! | [`endpoint`] | Base-URL resolution and URL construction |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Inbound decoding and typed notifications |
//! | [`transport`] | Connector seam and event loop |

// ============================================================================
// Modules
// ============================================================================

/// Bearer token sources.
pub mod auth;

/// Connection manager and its streams.
///
/// Use [`ConnectionManager::builder()`] to create a configured client.
pub mod client;

/// Configuration types.
pub mod config;

/// Socket URL resolution.
pub mod endpoint;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Message types.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Auth types
pub use auth::{NoToken, SharedToken, StaticToken, TokenSource};

// Client types
pub use client::{ClientBuilder, ConnectionManager, ConnectionStatus, MessageStream, StatusStream};

// Config types
pub use config::{ClientOptions, Environment, Origin, ReconnectPolicy};

// Endpoint types
pub use endpoint::BaseResolver;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ConnectionId;

// Protocol types
pub use protocol::{InboundMessage, Notification};

// Transport types
pub use transport::{Connector, Socket, TungsteniteConnector};
