//! Socket construction.
//!
//! [`Connector`] is the seam between the connection event loop and the
//! network. The default [`TungsteniteConnector`] performs a real WebSocket
//! handshake; tests and embedders can plug in anything that yields a frame
//! sink and a frame stream.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::pin::Pin;
use std::result::Result as StdResult;

use async_trait::async_trait;
use futures_util::{Sink, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as Frame;
use tracing::debug;
use url::Url;

use crate::endpoint::redact;
use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Outbound half of a socket.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = WsError> + Send>>;

/// Inbound half of a socket.
pub type FrameStream = Pin<Box<dyn Stream<Item = StdResult<Frame, WsError>> + Send>>;

// ============================================================================
// Socket
// ============================================================================

/// An open socket, split into its two halves.
pub struct Socket {
    /// Frames to the remote end.
    pub sink: FrameSink,
    /// Frames from the remote end.
    pub stream: FrameStream,
}

impl Socket {
    /// Creates a socket from separate halves.
    #[must_use]
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }

    /// Splits a duplex frame transport, e.g. a `WebSocketStream`.
    #[must_use]
    pub fn from_duplex<S>(duplex: S) -> Self
    where
        S: Stream<Item = StdResult<Frame, WsError>> + Sink<Frame, Error = WsError> + Send + 'static,
    {
        let (sink, stream) = duplex.split::<Frame>();
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket").finish_non_exhaustive()
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens sockets for the connection event loop.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Performs the handshake with `url`.
    ///
    /// # Errors
    ///
    /// Any error is treated as a failed open and fed to the backoff path.
    async fn connect(&self, url: &Url) -> Result<Socket>;
}

// ============================================================================
// TungsteniteConnector
// ============================================================================

/// WebSocket connector backed by `tokio-tungstenite` (`ws://` and `wss://`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<Socket> {
        let (ws_stream, response) = connect_async(url.as_str()).await?;

        debug!(
            url = %redact(url),
            status = %response.status(),
            "WebSocket handshake completed"
        );

        Ok(Socket::from_duplex(ws_stream))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{Ipv4Addr, SocketAddr};

    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_refused_is_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws")).unwrap();
        let result = TungsteniteConnector.connect(&url).await;

        let err = result.expect_err("nothing is listening");
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_connect_and_exchange_frame() {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");
            ws.next().await
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws/notifications")).unwrap();
        let mut socket = TungsteniteConnector.connect(&url).await.expect("connect");
        socket
            .sink
            .send(Frame::Text("hi".to_string().into()))
            .await
            .expect("send");

        let received = server.await.expect("server task");
        assert!(matches!(received, Some(Ok(Frame::Text(text))) if text.as_str() == "hi"));
    }
}
