//! Local WebSocket server and helpers for tests.
//!
//! The server binds `127.0.0.1:0`, records every frame it receives and
//! either echoes data frames back or sits on the connection without ever
//! reading (so pings go unanswered).

// ============================================================================
// Imports
// ============================================================================

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};
use crate::protocol::{Endpoint, FrameType, Message};
use crate::transport::{Dialer, TungsteniteDialer, WsStream};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for any single wait in tests.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll period for condition waits.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Helpers
// ============================================================================

/// Installs a test log subscriber once; honours `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Returns a `ws://` URL on a port nothing listens on.
pub(crate) async fn unused_ws_url() -> String {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("ws://127.0.0.1:{port}")
}

/// Polls `condition` until it holds, panicking after [`WAIT_TIMEOUT`].
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    let waited = timeout(WAIT_TIMEOUT, async {
        while !condition() {
            sleep(POLL_INTERVAL).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not met within {WAIT_TIMEOUT:?}");
}

// ============================================================================
// Recorded
// ============================================================================

/// A frame received by the test server.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    /// 1-based index of the server-side connection.
    pub connection: usize,
    /// The frame.
    pub message: Message,
}

// ============================================================================
// TestServer
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Mode {
    Echo,
    Silent,
}

/// In-process WebSocket server.
pub(crate) struct TestServer {
    port: u16,
    frames: mpsc::UnboundedReceiver<Recorded>,
    connections: Arc<AtomicUsize>,
    kill: broadcast::Sender<()>,
    accept_task: JoinHandle<()>,
}

impl TestServer {
    /// Starts a server that echoes text and binary frames.
    pub(crate) async fn echo() -> Self {
        Self::start(Mode::Echo).await
    }

    /// Starts a server that completes the handshake and never reads.
    pub(crate) async fn silent() -> Self {
        Self::start(Mode::Silent).await
    }

    async fn start(mode: Mode) -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();

        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (kill, _) = broadcast::channel(16);
        let connections = Arc::new(AtomicUsize::new(0));

        let accept_task = tokio::spawn({
            let kill = kill.clone();
            let connections = Arc::clone(&connections);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(Self::serve(
                        stream,
                        mode,
                        frames_tx.clone(),
                        kill.subscribe(),
                        Arc::clone(&connections),
                    ));
                }
            }
        });

        Self {
            port,
            frames,
            connections,
            kill,
            accept_task,
        }
    }

    async fn serve(
        stream: TcpStream,
        mode: Mode,
        frames: mpsc::UnboundedSender<Recorded>,
        mut kill: broadcast::Receiver<()>,
        connections: Arc<AtomicUsize>,
    ) {
        let Ok(mut ws) = accept_async(stream).await else {
            return;
        };
        let connection = connections.fetch_add(1, Ordering::SeqCst) + 1;

        match mode {
            Mode::Silent => {
                let _ = kill.recv().await;
            }
            Mode::Echo => loop {
                tokio::select! {
                    _ = kill.recv() => break,
                    frame = ws.next() => {
                        let Some(Ok(frame)) = frame else { break };
                        let echo = matches!(frame, WsMessage::Text(_) | WsMessage::Binary(_));

                        if let Some(message) = Message::from_ws(frame.clone()) {
                            let _ = frames.send(Recorded { connection, message });
                        }
                        if echo && ws.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
            },
        }
    }

    /// Returns `ws://127.0.0.1:{port}`.
    pub(crate) fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Number of completed server-side handshakes.
    pub(crate) fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Waits until at least `count` handshakes completed.
    pub(crate) async fn wait_for_connections(&self, count: usize) {
        wait_until(|| self.connection_count() >= count).await;
    }

    /// Drops every open server-side connection without a close handshake.
    pub(crate) fn drop_connections(&self) {
        let _ = self.kill.send(());
    }

    /// Next recorded frame of any type.
    pub(crate) async fn next_frame(&mut self) -> Recorded {
        timeout(WAIT_TIMEOUT, self.frames.recv())
            .await
            .expect("frame within timeout")
            .expect("server running")
    }

    /// Next recorded text or binary frame.
    pub(crate) async fn next_data_frame(&mut self) -> Recorded {
        loop {
            let recorded = self.next_frame().await;
            if !recorded.message.frame_type().is_control() {
                return recorded;
            }
        }
    }

    /// Drains recorded frames until `count` pings from `connection` were seen.
    pub(crate) async fn wait_for_pings(&mut self, connection: usize, count: usize) {
        let mut seen = 0;
        while seen < count {
            let recorded = self.next_frame().await;
            if recorded.connection == connection && recorded.message.frame_type() == FrameType::Ping
            {
                seen += 1;
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        let _ = self.kill.send(());
    }
}

// ============================================================================
// FlakyDialer
// ============================================================================

/// Fails the first `failures` dials, then dials for real.
#[derive(Debug)]
pub(crate) struct FlakyDialer {
    failures: AtomicUsize,
    attempts: Arc<AtomicUsize>,
}

impl FlakyDialer {
    pub(crate) fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of dial attempts.
    pub(crate) fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

#[async_trait]
impl Dialer for FlakyDialer {
    async fn dial(&self, endpoint: &Endpoint) -> Result<WsStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::connection("injected dial failure"));
        }

        TungsteniteDialer.dial(endpoint).await
    }
}
