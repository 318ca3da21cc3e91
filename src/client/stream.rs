//! Inbound message stream.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use crate::protocol::InboundMessage;

// ============================================================================
// MessageStream
// ============================================================================

/// Multicast feed of decoded inbound messages.
///
/// Every stream handed out by a manager reads the same underlying channel,
/// across any number of reconnects. There is no replay: a subscriber sees
/// only messages that arrive after it subscribed. Delivery is at-most-once;
/// a subscriber that falls behind skips what it missed and keeps going.
pub struct MessageStream {
    rx: broadcast::Receiver<InboundMessage>,
}

impl MessageStream {
    pub(crate) fn new(rx: broadcast::Receiver<InboundMessage>) -> Self {
        Self { rx }
    }

    /// Waits for the next message.
    ///
    /// Returns `None` once the manager has been dropped.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Message subscriber lagging; messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next message if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<InboundMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Message subscriber lagging; messages dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

impl Clone for MessageStream {
    /// Creates an independent subscriber starting from now.
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.resubscribe(),
        }
    }
}

impl fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("pending", &self.rx.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
