//! Per-generation connection event loop.
//!
//! Each `connect()` spawns one [`ConnectionTask`]. The task owns the socket,
//! the handshake, the backoff sleep and the reconnect loop for its
//! generation, and reports every transition back to the manager tagged with
//! its [`ConnectionId`].
//!
//! # Event Loop
//!
//! ```text
//! ┌──► resolve URL ──► handshake ──► serve ──► on_close ──► sleep ──┐
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every await point also watches the command channel, so a `Close` command
//! (or the manager going away) abandons a pending handshake or sleep
//! immediately and closes a live socket with the normal closure code.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, trace, warn};
use url::Url;

use crate::client::manager::{CloseDecision, Shared};
use crate::endpoint::redact;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::InboundMessage;
use crate::protocol::message::HELLO_FRAME;

use super::connector::{Connector, FrameSink, Socket};

// ============================================================================
// Constants
// ============================================================================

/// Time allowed for the closing handshake before the socket is dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Reason sent with a client-initiated close.
const CLOSE_REASON: &str = "client disconnect";

// ============================================================================
// Types
// ============================================================================

/// Commands from the manager to the event loop.
#[derive(Debug)]
pub(crate) enum Command {
    /// Write a text frame if connected; dropped otherwise.
    Send(String),
    /// Close the socket with the normal code and end the generation.
    Close,
}

/// How a socket session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Closed by command or superseded; no further reporting.
    Cancelled,
    /// Closed remotely or failed, with the remote code if any.
    Closed(Option<u16>),
}

/// Everything needed for one connection attempt.
struct Attempt {
    connector: Arc<dyn Connector>,
    url: Result<Url>,
    handshake_timeout: Duration,
    send_hello: bool,
}

// ============================================================================
// ConnectionTask
// ============================================================================

/// Event loop for one connection generation.
pub(crate) struct ConnectionTask {
    shared: Weak<Shared>,
    id: ConnectionId,
    path: String,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl ConnectionTask {
    pub(crate) fn new(
        shared: Weak<Shared>,
        id: ConnectionId,
        path: String,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            shared,
            id,
            path,
            commands,
        }
    }

    /// Runs attempts until the generation is cancelled, superseded or closed
    /// with a terminal code.
    pub(crate) async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let Some(next) = self.prepare() else {
                break;
            };

            let exit = match next.url {
                Ok(url) => {
                    self.open_and_serve(
                        next.connector.as_ref(),
                        &url,
                        attempt,
                        next.handshake_timeout,
                        next.send_hello,
                    )
                    .await
                }
                Err(e) => {
                    warn!(connection_id = %self.id, attempt, error = %e, "Could not build socket URL");
                    Exit::Closed(None)
                }
            };

            let code = match exit {
                Exit::Cancelled => break,
                Exit::Closed(code) => code,
            };

            let Some(shared) = self.shared.upgrade() else {
                break;
            };
            let decision = shared.on_close(self.id, code);
            drop(shared);

            match decision {
                CloseDecision::Retry(delay) => {
                    trace!(
                        connection_id = %self.id,
                        delay_ms = delay.as_millis() as u64,
                        "Waiting before reconnect"
                    );
                    if self.until_cancelled(sleep(delay)).await.is_none() {
                        break;
                    }
                }
                CloseDecision::Stop | CloseDecision::Stale => break,
            }
        }

        debug!(connection_id = %self.id, attempts = attempt, "Connection task finished");
    }

    /// Snapshots what the next attempt needs without holding the manager.
    ///
    /// Returns `None` if the manager is gone or the generation is stale.
    fn prepare(&self) -> Option<Attempt> {
        let shared = self.shared.upgrade()?;
        let url = shared.attempt_url(self.id, &self.path)?;
        let options = shared.options();

        Some(Attempt {
            connector: shared.connector(),
            url,
            handshake_timeout: options.handshake_timeout,
            send_hello: options.send_hello,
        })
    }

    async fn open_and_serve(
        &mut self,
        connector: &dyn Connector,
        url: &Url,
        attempt: u32,
        handshake_timeout: Duration,
        send_hello: bool,
    ) -> Exit {
        debug!(connection_id = %self.id, attempt, url = %redact(url), "Opening socket");

        let opened = self
            .until_cancelled(timeout(handshake_timeout, connector.connect(url)))
            .await;

        match opened {
            None => {
                debug!(connection_id = %self.id, "Handshake abandoned");
                Exit::Cancelled
            }
            Some(Ok(Ok(socket))) => self.serve(socket, send_hello).await,
            Some(Ok(Err(e))) => {
                warn!(connection_id = %self.id, attempt, error = %e, "Failed to open socket");
                Exit::Closed(None)
            }
            Some(Err(_)) => {
                let e = Error::connection_timeout(handshake_timeout.as_millis() as u64);
                warn!(connection_id = %self.id, attempt, error = %e, "Failed to open socket");
                Exit::Closed(None)
            }
        }
    }

    /// Drives `fut` while watching for cancellation.
    ///
    /// Returns `None` on a `Close` command or when the manager is gone.
    /// Outbound frames arriving meanwhile are dropped.
    async fn until_cancelled<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::pin!(fut);

        loop {
            tokio::select! {
                output = &mut fut => return Some(output),

                command = self.commands.recv() => match command {
                    Some(Command::Send(_)) => {
                        trace!(connection_id = %self.id, "Not connected; dropping outbound frame");
                    }
                    Some(Command::Close) | None => return None,
                },
            }
        }
    }

    /// Pumps frames for one open socket.
    async fn serve(&mut self, socket: Socket, send_hello: bool) -> Exit {
        let Socket { mut sink, mut stream } = socket;
        let id = self.id;

        let current = self
            .shared
            .upgrade()
            .is_some_and(|shared| shared.on_open(id));
        if !current {
            close_normally(&mut sink).await;
            return Exit::Cancelled;
        }

        if send_hello
            && let Err(e) = sink.send(Frame::Text(HELLO_FRAME.to_string().into())).await
        {
            warn!(connection_id = %id, error = %e, "Failed to send greeting");
            return Exit::Closed(None);
        }

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Frame::Close(close))) => {
                        let code = close.map(|frame| u16::from(frame.code));
                        debug!(connection_id = %id, ?code, "Socket closed by remote");
                        // Completes the closing handshake
                        let _ = timeout(CLOSE_TIMEOUT, sink.close()).await;
                        return Exit::Closed(code);
                    }

                    Some(Ok(frame)) => {
                        let Some(message) = InboundMessage::from_frame(&frame) else {
                            continue;
                        };
                        trace!(connection_id = %id, kind = ?message.kind(), "Frame received");

                        if let Some(shared) = self.shared.upgrade() {
                            shared.on_message(id, message);
                        }
                    }

                    Some(Err(e)) => {
                        warn!(connection_id = %id, error = %e, "Socket error");
                        return Exit::Closed(None);
                    }

                    None => {
                        debug!(connection_id = %id, "Socket stream ended");
                        return Exit::Closed(None);
                    }
                },

                command = self.commands.recv() => match command {
                    Some(Command::Send(text)) => {
                        if let Err(e) = sink.send(Frame::Text(text.into())).await {
                            warn!(connection_id = %id, error = %e, "Failed to send frame");
                            return Exit::Closed(None);
                        }
                        trace!(connection_id = %id, "Frame sent");
                    }

                    Some(Command::Close) | None => {
                        close_normally(&mut sink).await;
                        debug!(connection_id = %id, "Socket closed by client");
                        return Exit::Cancelled;
                    }
                },
            }
        }
    }
}

/// Sends a normal-closure frame, bounded by [`CLOSE_TIMEOUT`].
async fn close_normally(sink: &mut FrameSink) {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: CLOSE_REASON.to_string().into(),
    };

    let closing = async {
        sink.send(Frame::Close(Some(frame))).await?;
        sink.close().await
    };

    if let Ok(Err(e)) = timeout(CLOSE_TIMEOUT, closing).await {
        trace!(error = %e, "Close handshake incomplete");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::ConnectionIdGenerator;

    fn orphan_task() -> (ConnectionTask, mpsc::UnboundedSender<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionIdGenerator::default().next();
        (ConnectionTask::new(Weak::new(), id, "notifications".into(), rx), tx)
    }

    #[tokio::test]
    async fn test_task_without_manager_exits() {
        let (task, _tx) = orphan_task();
        tokio::time::timeout(Duration::from_secs(1), task.run())
            .await
            .expect("task should exit immediately");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_command_cancels_wait() {
        let (mut task, tx) = orphan_task();
        tx.send(Command::Close).unwrap();

        let result = task.until_cancelled(sleep(Duration::from_secs(60))).await;
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_waiting_is_dropped() {
        let (mut task, tx) = orphan_task();
        tx.send(Command::Send("x".into())).unwrap();

        let result = task.until_cancelled(async { 7 }).await;
        assert_eq!(result, Some(7));

        let result = task.until_cancelled(sleep(Duration::from_millis(10))).await;
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_dropped_sender_cancels_wait() {
        let (mut task, tx) = orphan_task();
        drop(tx);

        let result = task.until_cancelled(std::future::pending::<()>()).await;
        assert!(result.is_none());
    }
}
