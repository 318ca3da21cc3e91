//! Client runtime options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use realtime_notify::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_hello()
//!     .with_handshake_timeout(Duration::from_secs(5));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default handshake timeout.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default message channel capacity.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 256;

/// Default status channel capacity.
pub const DEFAULT_STATUS_CAPACITY: usize = 64;

// ============================================================================
// ClientOptions
// ============================================================================

/// Runtime options for the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Send a `{"type":"hello"}` greeting after every successful open.
    pub send_hello: bool,

    /// Maximum time a handshake may take before it counts as failed.
    pub handshake_timeout: Duration,

    /// Buffered inbound messages per subscriber before it starts lagging.
    pub message_capacity: usize,

    /// Buffered status transitions per subscriber.
    pub status_capacity: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            send_hello: false,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            status_capacity: DEFAULT_STATUS_CAPACITY,
        }
    }

    /// Enables the greeting frame.
    #[inline]
    #[must_use]
    pub fn with_hello(mut self) -> Self {
        self.send_hello = true;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the inbound message buffer size.
    #[inline]
    #[must_use]
    pub fn with_message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }

    /// Sets the status transition buffer size.
    #[inline]
    #[must_use]
    pub fn with_status_capacity(mut self, capacity: usize) -> Self {
        self.status_capacity = capacity;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero capacities or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.message_capacity == 0 || self.status_capacity == 0 {
            return Err(Error::config("Channel capacities must be greater than zero"));
        }

        if self.handshake_timeout.is_zero() {
            return Err(Error::config("Handshake timeout must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
