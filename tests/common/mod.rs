//! Shared fixtures for integration tests.
//!
//! - [`ScriptedConnector`]: in-memory sockets following a fixed script, for
//!   exact timing under paused tokio time
//! - [`MockServer`]: a real localhost WebSocket server

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt, sink, stream};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use url::Url;

use realtime_notify::{
    ClientBuilder, ConnectionManager, Connector, Environment, Error, ReconnectPolicy, Result,
    Socket,
};

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Scripted Connector
// ============================================================================

/// What the next connection attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handshake fails immediately.
    Fail,
    /// Handshake never completes.
    Hang,
    /// Socket opens and stays open until the test drops its [`Remote`].
    Open,
    /// Socket opens, then the remote end goes away at once.
    OpenThenDrop,
}

/// One recorded connection attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub at: Instant,
    pub url: Url,
}

/// Test-side end of an in-memory socket.
pub struct Remote {
    inbound: Option<mpsc::UnboundedSender<std::result::Result<Message, WsError>>>,
    pub outbound: mpsc::UnboundedReceiver<Message>,
}

impl Remote {
    /// Pushes a frame to the client.
    pub fn push(&self, frame: Message) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Ok(frame));
        }
    }

    /// Pushes a text frame to the client.
    pub fn push_text(&self, text: &str) {
        self.push(Message::Text(text.to_string().into()));
    }

    /// Ends the inbound stream without a close frame.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Waits for the next frame the client sent.
    pub async fn next_sent(&mut self) -> Option<Message> {
        self.outbound.recv().await
    }
}

/// Decrements the live count when the socket's stream is dropped.
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Connector whose attempts follow a script; attempts past the end fail.
#[derive(Clone)]
pub struct ScriptedConnector {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    attempts: mpsc::UnboundedSender<Attempt>,
    remotes: mpsc::UnboundedSender<Remote>,
    live: Arc<AtomicUsize>,
}

/// Receiving side of a [`ScriptedConnector`].
pub struct Probe {
    pub attempts: mpsc::UnboundedReceiver<Attempt>,
    pub remotes: mpsc::UnboundedReceiver<Remote>,
    live: Arc<AtomicUsize>,
}

impl Probe {
    /// Number of sockets currently held open by the client.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Waits for the next attempt.
    pub async fn next_attempt(&mut self) -> Attempt {
        self.attempts.recv().await.expect("connector dropped")
    }

    /// Waits for the next opened socket.
    pub async fn next_remote(&mut self) -> Remote {
        self.remotes.recv().await.expect("connector dropped")
    }
}

impl ScriptedConnector {
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> (Self, Probe) {
        let (attempts_tx, attempts_rx) = mpsc::unbounded_channel();
        let (remotes_tx, remotes_rx) = mpsc::unbounded_channel();
        let live = Arc::new(AtomicUsize::new(0));

        let connector = Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            attempts: attempts_tx,
            remotes: remotes_tx,
            live: Arc::clone(&live),
        };
        let probe = Probe {
            attempts: attempts_rx,
            remotes: remotes_rx,
            live,
        };

        (connector, probe)
    }

    fn open_socket(&self, keep_open: bool) -> Socket {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        self.live.fetch_add(1, Ordering::SeqCst);
        let guard = LiveGuard(Arc::clone(&self.live));

        let incoming = stream::unfold((inbound_rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|item| (item, (rx, guard)))
        });

        let outgoing = sink::unfold(outbound_tx, |tx, frame: Message| async move {
            tx.send(frame).map_err(|_| WsError::ConnectionClosed)?;
            Ok::<_, WsError>(tx)
        });

        let remote = Remote {
            inbound: keep_open.then_some(inbound_tx),
            outbound: outbound_rx,
        };
        let _ = self.remotes.send(remote);

        Socket::new(Box::pin(outgoing), Box::pin(incoming))
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &Url) -> Result<Socket> {
        let _ = self.attempts.send(Attempt {
            at: Instant::now(),
            url: url.clone(),
        });

        let outcome = self.script.lock().pop_front().unwrap_or(Outcome::Fail);
        match outcome {
            Outcome::Fail => Err(Error::connection("connection refused")),
            Outcome::Hang => std::future::pending().await,
            Outcome::Open => Ok(self.open_socket(true)),
            Outcome::OpenThenDrop => Ok(self.open_socket(false)),
        }
    }
}

/// Returns a builder wired to a scripted connector.
pub fn scripted_builder(script: impl IntoIterator<Item = Outcome>) -> (ClientBuilder, Probe) {
    init_tracing();

    let (connector, probe) = ScriptedConnector::new(script);
    let builder = ConnectionManager::builder()
        .environment(Environment::new().with_ws_url("ws://scripted.test/ws"))
        .connector(connector);

    (builder, probe)
}

/// Builds a manager wired to a scripted connector.
pub fn scripted_manager(
    script: impl IntoIterator<Item = Outcome>,
    policy: ReconnectPolicy,
) -> (ConnectionManager, Probe) {
    let (builder, probe) = scripted_builder(script);
    let manager = builder.policy(policy).build().expect("valid config");
    (manager, probe)
}

// ============================================================================
// Mock Server
// ============================================================================

/// A real WebSocket server on localhost.
pub struct MockServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockServer {
    pub async fn new() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// Base URL to put in `Environment::ws_url`.
    pub fn ws_base(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Accepts one client, returning the socket and the request URI.
    pub async fn accept(&self) -> anyhow::Result<(WebSocketStream<TcpStream>, String)> {
        let (stream, _) = self.listener.accept().await?;

        let uri = Arc::new(Mutex::new(String::new()));
        let seen = Arc::clone(&uri);
        let callback = move |request: &Request,
                             response: Response|
              -> std::result::Result<Response, ErrorResponse> {
            *seen.lock() = request.uri().to_string();
            Ok(response)
        };

        let ws = tokio_tungstenite::accept_hdr_async(stream, callback).await?;
        let uri = uri.lock().clone();
        Ok((ws, uri))
    }

    /// Accepts one client and echoes every data frame back.
    pub fn spawn_echo(self) -> tokio::task::JoinHandle<anyhow::Result<String>> {
        tokio::spawn(async move {
            let (mut ws, uri) = self.accept().await?;
            while let Some(frame) = ws.next().await {
                match frame? {
                    frame @ (Message::Text(_) | Message::Binary(_)) => ws.send(frame).await?,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Ok(uri)
        })
    }
}
