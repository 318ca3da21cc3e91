//! WebSocket transport layer.
//!
//! This module owns everything that touches a socket: opening it through a
//! [`Connector`], and the per-generation event loop that pumps frames,
//! honours close commands and schedules reconnects.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   Command (Send/Close)   ┌──────────────────┐
//! │  ConnectionManager   │─────────────────────────►│  ConnectionTask  │
//! │                      │                          │                  │
//! │  status / messages   │◄─────────────────────────│  Connector ──► ws│
//! └──────────────────────┘  on_open/on_message/     └──────────────────┘
//!                           on_close (id-guarded)
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | Socket construction seam and tungstenite connector |
//! | `connection` | Per-generation event loop |

// ============================================================================
// Submodules
// ============================================================================

/// Per-generation event loop.
pub(crate) mod connection;

/// Socket construction.
pub mod connector;

// ============================================================================
// Re-exports
// ============================================================================

pub use connector::{Connector, FrameSink, FrameStream, Socket, TungsteniteConnector};
