//! The connection manager.
//!
//! [`ConnectionManager`] keeps a best-effort live socket to one logical
//! endpoint and hides reconnection from its consumers. It is constructed
//! once per session and shared by cloning (clones share all state).
//!
//! # Lifecycle
//!
//! ```text
//!              connect()                   open
//! disconnected ─────────► reconnecting ───────────► connected
//!      ▲                    ▲    │                     │
//!      │                    │    │ close / error       │ close / error
//!      │                    │    ▼                     │
//!      │    backoff elapsed └─ disconnected ◄──────────┘
//!      │
//!      └──── disconnect() from any state (no reconnect)
//! ```
//!
//! Each `connect()` starts a new generation with its own [`ConnectionId`].
//! The generation's event loop reports back through [`Shared`], which drops
//! every report whose id is no longer current.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace};
use url::Url;

use crate::auth::{TokenSource, current_token};
use crate::config::{ClientOptions, ReconnectPolicy};
use crate::endpoint::{Endpoint, validate_path};
use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, ConnectionIdGenerator};
use crate::protocol::InboundMessage;
use crate::protocol::message::encode_outbound;
use crate::transport::connection::{Command, ConnectionTask};
use crate::transport::Connector;

use super::backoff::Backoff;
use super::builder::ClientBuilder;
use super::status::{ConnectionStatus, StatusCell, StatusStream};
use super::stream::MessageStream;

// ============================================================================
// Generation
// ============================================================================

/// The current generation: its id, its event loop's command channel, and
/// the path it serves.
struct Generation {
    id: ConnectionId,
    commands: mpsc::UnboundedSender<Command>,
    path: String,
}

impl Generation {
    /// Tells the event loop to close with a normal code and stop.
    fn cancel(self) {
        // Loop may already have exited
        let _ = self.commands.send(Command::Close);
        debug!(connection_id = %self.id, path = %self.path, "Generation cancelled");
    }
}

/// Mutable manager state, guarded by one lock.
struct ManagerState {
    current: Option<Generation>,
    backoff: Backoff,
}

/// What a generation should do after its socket closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseDecision {
    /// Wait this long, then open a new socket.
    Retry(Duration),
    /// Terminal closure; the generation ends.
    Stop,
    /// The generation was superseded; exit without touching state.
    Stale,
}

// ============================================================================
// Shared
// ============================================================================

/// State shared between the manager handles and the event loops.
///
/// Event loops hold only a weak reference, so dropping the last
/// [`ConnectionManager`] clone shuts every loop down.
pub(crate) struct Shared {
    endpoint: Endpoint,
    tokens: Arc<dyn TokenSource>,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    options: ClientOptions,
    ids: ConnectionIdGenerator,
    state: Mutex<ManagerState>,
    status: StatusCell,
    messages: broadcast::Sender<InboundMessage>,
}

impl Shared {
    fn is_current(state: &ManagerState, id: ConnectionId) -> bool {
        state.current.as_ref().is_some_and(|g| g.id == id)
    }

    /// Returns the connector for a new attempt.
    pub(crate) fn connector(&self) -> Arc<dyn Connector> {
        Arc::clone(&self.connector)
    }

    /// Returns the runtime options.
    pub(crate) fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Resolves the URL for the next attempt of generation `id`.
    ///
    /// Returns `None` if the generation is stale. The URL, token included,
    /// is rebuilt on every attempt.
    pub(crate) fn attempt_url(&self, id: ConnectionId, path: &str) -> Option<Result<Url>> {
        if !Self::is_current(&self.state.lock(), id) {
            return None;
        }

        let token = current_token(self.tokens.as_ref());
        Some(self.endpoint.url_for(path, token.as_deref()))
    }

    /// Records a successful open. Returns `false` if the generation is stale.
    pub(crate) fn on_open(&self, id: ConnectionId) -> bool {
        let mut state = self.state.lock();
        if !Self::is_current(&state, id) {
            return false;
        }

        state.backoff.reset();
        self.status.set(ConnectionStatus::Connected);
        info!(connection_id = %id, "Connected");
        true
    }

    /// Publishes an inbound message. Returns `false` if the generation is stale.
    pub(crate) fn on_message(&self, id: ConnectionId, message: InboundMessage) -> bool {
        let state = self.state.lock();
        if !Self::is_current(&state, id) {
            return false;
        }

        // No subscribers is fine
        let _ = self.messages.send(message);
        true
    }

    /// Records a closure (remote close, transport error or failed open).
    ///
    /// `code` is the remote closure code, if one was received.
    pub(crate) fn on_close(&self, id: ConnectionId, code: Option<u16>) -> CloseDecision {
        let mut state = self.state.lock();
        if !Self::is_current(&state, id) {
            return CloseDecision::Stale;
        }

        self.status.set(ConnectionStatus::Disconnected);

        if !self.policy.should_reconnect(code) {
            state.current = None;
            info!(connection_id = %id, ?code, "Disconnected by remote; not reconnecting");
            return CloseDecision::Stop;
        }

        self.status.set(ConnectionStatus::Reconnecting);
        let delay = state.backoff.next_delay();
        info!(
            connection_id = %id,
            ?code,
            delay_ms = delay.as_millis() as u64,
            failures = state.backoff.failures(),
            "Disconnected; reconnect scheduled"
        );
        CloseDecision::Retry(delay)
    }
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Self-healing notification client.
///
/// # Example
///
/// ```no_run
/// use realtime_notify::{ConnectionManager, Environment, SharedToken};
///
/// # async fn example() -> realtime_notify::Result<()> {
/// let token = SharedToken::new();
/// let manager = ConnectionManager::builder()
///     .environment(Environment::new().with_ws_url("wss://host/ws"))
///     .token_source(token.clone())
///     .build()?;
///
/// token.set("bearer-token");
/// let mut messages = manager.connect("notifications")?;
///
/// while let Some(_message) = messages.recv().await {
///     // refresh views
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

// ============================================================================
// ConnectionManager - Constructor
// ============================================================================

impl ConnectionManager {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        endpoint: Endpoint,
        tokens: Arc<dyn TokenSource>,
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
        options: ClientOptions,
    ) -> Self {
        let (messages, _) = broadcast::channel(options.message_capacity);

        let shared = Shared {
            endpoint,
            tokens,
            connector,
            state: Mutex::new(ManagerState {
                current: None,
                backoff: Backoff::new(&policy),
            }),
            status: StatusCell::new(options.status_capacity),
            policy,
            options,
            ids: ConnectionIdGenerator::default(),
            messages,
        };

        Self {
            shared: Arc::new(shared),
        }
    }
}

// ============================================================================
// ConnectionManager - Public API
// ============================================================================

impl ConnectionManager {
    /// Connects to `path`, superseding any previous connection.
    ///
    /// Tears down the current socket and pending reconnect synchronously,
    /// then opens a new socket in the background. Returns the shared message
    /// stream, which keeps delivering across reconnects.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `path` contains `?`, `#`, whitespace or
    ///   control characters
    /// - [`Error::Config`] if called outside a tokio runtime
    ///
    /// Transport failures are never returned here; they drive the status.
    pub fn connect(&self, path: &str) -> Result<MessageStream> {
        validate_path(path)?;

        let runtime = Handle::try_current()
            .map_err(|_| Error::config("connect() must be called within a tokio runtime"))?;

        let stream = self.messages();
        let id = self.shared.ids.next();
        let (commands, command_rx) = mpsc::unbounded_channel();

        {
            let mut state = self.shared.state.lock();

            if let Some(previous) = state.current.take() {
                previous.cancel();
            }

            state.current = Some(Generation {
                id,
                commands,
                path: path.to_string(),
            });
            self.shared.status.set(ConnectionStatus::Reconnecting);
        }

        debug!(connection_id = %id, path, "Connecting");

        let task = ConnectionTask::new(Arc::downgrade(&self.shared), id, path.to_string(), command_rx);
        runtime.spawn(task.run());

        Ok(stream)
    }

    /// Closes the connection for good.
    ///
    /// Cancels any pending reconnect, closes a live socket with the normal
    /// closure code, and sets the status to `disconnected`. No reconnect
    /// happens until the next [`connect`](Self::connect).
    pub fn disconnect(&self) {
        let mut state = self.shared.state.lock();

        if let Some(generation) = state.current.take() {
            generation.cancel();
        }

        state.backoff.reset();
        self.shared.status.set(ConnectionStatus::Disconnected);
    }

    /// Sends a payload as a JSON text frame.
    ///
    /// Frames are never queued: while not connected the payload is dropped
    /// and `Ok(false)` is returned. `Ok(true)` means the frame was handed to
    /// the live socket, not that the server received it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload cannot be serialized.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<bool> {
        let frame = encode_outbound(payload)?;

        let state = self.shared.state.lock();
        if !self.shared.status.get().is_connected() {
            trace!("Not connected; dropping outbound frame");
            return Ok(false);
        }

        Ok(state
            .current
            .as_ref()
            .is_some_and(|g| g.commands.send(Command::Send(frame)).is_ok()))
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.get()
    }

    /// Subscribes to status transitions, starting with the current status.
    #[must_use]
    pub fn subscribe_status(&self) -> StatusStream {
        self.shared.status.subscribe()
    }

    /// Subscribes to inbound messages (no replay).
    #[must_use]
    pub fn messages(&self) -> MessageStream {
        MessageStream::new(self.shared.messages.subscribe())
    }

    /// Returns the current generation id, if connecting or connected.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.shared.state.lock().current.as_ref().map(|g| g.id)
    }

    /// Returns the path of the current generation.
    #[must_use]
    pub fn path(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .current
            .as_ref()
            .map(|g| g.path.clone())
    }

    /// Delay the next failure would schedule.
    #[must_use]
    pub fn next_backoff(&self) -> Duration {
        self.shared.state.lock().backoff.current()
    }

    /// Returns the reconnect policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.shared.policy
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("status", &self.status())
            .field("connection_id", &self.connection_id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::config::Environment;

    fn manager() -> ConnectionManager {
        ConnectionManager::builder()
            .environment(Environment::new().with_ws_url("ws://127.0.0.1:9/ws"))
            .build()
            .expect("valid config")
    }

    #[test]
    fn test_initial_state() {
        let manager = manager();
        assert_eq!(manager.status(), ConnectionStatus::Disconnected);
        assert!(manager.connection_id().is_none());
        assert_eq!(manager.next_backoff(), Duration::from_secs(1));
    }

    #[test]
    fn test_send_while_disconnected_is_dropped() {
        let manager = manager();
        assert!(!manager.send(&json!({"action": "ping"})).unwrap());
    }

    #[test]
    fn test_connect_outside_runtime_fails() {
        let manager = manager();
        let err = manager.connect("notifications").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_path() {
        let manager = manager();
        let err = manager.connect("notifications?x=1").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(manager.connection_id().is_none());
    }

    #[tokio::test]
    async fn test_connect_then_disconnect() {
        let manager = manager();
        let mut status = manager.subscribe_status();

        manager.connect("notifications").expect("connect");
        assert_eq!(manager.status(), ConnectionStatus::Reconnecting);
        assert_eq!(manager.path().as_deref(), Some("notifications"));

        manager.disconnect();
        assert_eq!(manager.status(), ConnectionStatus::Disconnected);
        assert!(manager.connection_id().is_none());

        assert_eq!(status.recv().await, Some(ConnectionStatus::Disconnected));
        assert_eq!(status.recv().await, Some(ConnectionStatus::Reconnecting));
        assert_eq!(status.recv().await, Some(ConnectionStatus::Disconnected));
    }

    #[tokio::test]
    async fn test_reconnect_supersedes_generation() {
        let manager = manager();

        manager.connect("notifications").expect("first");
        let first = manager.connection_id().expect("id");
        manager.connect("ws/notifications").expect("second");
        let second = manager.connection_id().expect("id");

        assert!(second > first);
        manager.disconnect();
    }

    #[tokio::test]
    async fn test_send_unserializable_payload() {
        use std::collections::HashMap;

        let manager = manager();
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);

        assert!(matches!(manager.send(&map), Err(Error::Json(_))));
    }
}
