//! Socket payload types.
//!
//! The channel carries one logical message per frame. Outbound payloads are
//! serialized as JSON text frames; inbound frames are decoded best-effort.
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `InboundMessage` | Remote → Local | Decoded frame, JSON or raw |
//! | `Notification` | Remote → Local | Typed view of a JSON frame |
//! | any `Serialize` | Local → Remote | Command or telemetry, best-effort |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Frame decoding and outbound encoding |
//! | `notification` | Warehouse notification types |

// ============================================================================
// Submodules
// ============================================================================

/// Frame decoding and outbound encoding.
pub mod message;

/// Warehouse notification types.
pub mod notification;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{HELLO_FRAME, InboundMessage};
pub use notification::{InventoryAlert, Location, Notification, RobotUpdate, Severity};
