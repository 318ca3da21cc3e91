//! Connection status and its subscribable stream.
//!
//! The status behaves like a current-value cell with change notification:
//! a new subscriber first sees the current value, then every later
//! transition in order. Setting the value it already holds emits nothing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Health of the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Socket open and delivering messages.
    Connected,

    /// No socket; initial state, and the state after `disconnect()`.
    Disconnected,

    /// Handshake in flight or waiting for the backoff timer.
    Reconnecting,
}

impl ConnectionStatus {
    /// Returns the lowercase wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
        }
    }

    /// Returns `true` for [`ConnectionStatus::Connected`].
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// StatusCell
// ============================================================================

/// Current status plus a broadcast of transitions.
///
/// The current value and the broadcast are updated under one lock so a
/// subscriber never misses or duplicates a transition around the moment it
/// subscribes.
pub(crate) struct StatusCell {
    current: Mutex<ConnectionStatus>,
    tx: broadcast::Sender<ConnectionStatus>,
}

impl StatusCell {
    /// Creates a cell holding [`ConnectionStatus::Disconnected`].
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            current: Mutex::new(ConnectionStatus::Disconnected),
            tx,
        }
    }

    /// Returns the current status.
    pub(crate) fn get(&self) -> ConnectionStatus {
        *self.current.lock()
    }

    /// Stores `status`, notifying subscribers if it changed.
    ///
    /// Returns `true` if a transition was emitted.
    pub(crate) fn set(&self, status: ConnectionStatus) -> bool {
        let mut current = self.current.lock();
        if *current == status {
            return false;
        }

        *current = status;
        // No receivers is fine
        let _ = self.tx.send(status);
        true
    }

    /// Subscribes, replaying the current value first.
    pub(crate) fn subscribe(&self) -> StatusStream {
        let current = self.current.lock();
        StatusStream {
            replay: Some(*current),
            rx: self.tx.subscribe(),
            last: None,
        }
    }
}

// ============================================================================
// StatusStream
// ============================================================================

/// Subscriber view of status transitions.
///
/// Yields the status at subscription time, then each transition. Never
/// yields the same value twice in a row, even after falling behind.
pub struct StatusStream {
    replay: Option<ConnectionStatus>,
    rx: broadcast::Receiver<ConnectionStatus>,
    last: Option<ConnectionStatus>,
}

impl StatusStream {
    /// Waits for the next status.
    ///
    /// Returns `None` once the manager has been dropped.
    pub async fn recv(&mut self) -> Option<ConnectionStatus> {
        if let Some(status) = self.replay.take() {
            return Some(self.record(status));
        }

        loop {
            match self.rx.recv().await {
                Ok(status) if Some(status) == self.last => continue,
                Ok(status) => return Some(self.record(status)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Status subscriber lagging; transitions dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next status if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<ConnectionStatus> {
        if let Some(status) = self.replay.take() {
            return Some(self.record(status));
        }

        loop {
            match self.rx.try_recv() {
                Ok(status) if Some(status) == self.last => continue,
                Ok(status) => return Some(self.record(status)),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Status subscriber lagging; transitions dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits until the status equals `target`.
    ///
    /// Returns `false` if the manager was dropped first.
    pub async fn wait_for(&mut self, target: ConnectionStatus) -> bool {
        while let Some(status) = self.recv().await {
            if status == target {
                return true;
            }
        }
        false
    }

    fn record(&mut self, status: ConnectionStatus) -> ConnectionStatus {
        self.last = Some(status);
        status
    }
}

impl fmt::Debug for StatusStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusStream")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
