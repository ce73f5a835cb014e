//! Persistent WebSocket client facade.
//!
//! A [`Client`] is a cheap, cloneable handle. All clones share one
//! supervisor, one outbound queue and one set of callbacks. Dropping the
//! last clone cancels the client the same way [`Client::shutdown`] does,
//! without waiting for teardown.
//!
//! # Example
//!
//! ```no_run
//! use persistent_ws::{Client, Message};
//!
//! # async fn example() -> persistent_ws::Result<()> {
//! let client = Client::builder("wss://stream.example.com/feed")
//!     .header("Authorization", "Bearer token")
//!     .on_receive(|message: Message| println!("{:?}", message.as_text()))
//!     .build()?;
//!
//! client.connect().await?;
//! client.send_text("subscribe").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Endpoint, Message};
use crate::transport::{ConnectionState, Dialer, Handlers, Supervisor};

use super::builder::ClientBuilder;
use super::config::Config;

// ============================================================================
// Client
// ============================================================================

/// Handle to a self-healing WebSocket connection.
///
/// # Callbacks and lifetime
///
/// A callback that captures a `Client` clone keeps the client alive until
/// [`shutdown`](Self::shutdown) is called explicitly.
#[derive(Clone)]
pub struct Client {
    /// Shared connection supervisor.
    pub(crate) inner: Arc<Supervisor>,
    /// Sending half of the outbound handoff queue.
    outbound: mpsc::Sender<Message>,
    /// Cancels the root token when the last clone is dropped.
    _guard: Arc<DropGuard>,
}

// ============================================================================
// Client - Display
// ============================================================================

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", self.inner.endpoint())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Creates a client for `url` with default settings.
    ///
    /// Does not dial; call [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `url` is not a `ws://` or `wss://` URL.
    pub fn new(url: &str) -> Result<Self> {
        Self::builder(url).build()
    }

    /// Creates a client that sends `headers` with every handshake.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] or [`Error::InvalidHeader`].
    pub fn with_headers<I, K, V>(url: &str, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(Self::builder(url), |builder, (name, value)| {
                builder.header(name, value)
            })
            .build()
    }

    /// Creates a configuration builder for a client.
    #[inline]
    #[must_use]
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// Assembles a client from validated parts.
    pub(crate) fn from_parts(
        endpoint: Endpoint,
        config: Config,
        dialer: Arc<dyn Dialer>,
        handlers: Handlers,
    ) -> Self {
        let root = CancellationToken::new();
        let (inner, outbound) = Supervisor::new(
            endpoint,
            config,
            dialer,
            Arc::new(handlers),
            root.clone(),
        );

        debug!(url = %inner.endpoint(), "Client created");

        Self {
            inner,
            outbound,
            _guard: Arc::new(root.drop_guard()),
        }
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Dials until connected, retrying every `reconnect_delay`.
    ///
    /// Runs the on-connect callback once the loops are up. Returns at once
    /// if a connection is already live. After this returns the client keeps
    /// itself connected: any read failure, write failure or missed pong
    /// tears the connection down and dials again.
    ///
    /// # Errors
    ///
    /// [`Error::Shutdown`] if the client is, or becomes, shut down.
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Closes the live connection. A fresh one is dialed right after.
    ///
    /// No-op when nothing is connected.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Stops the client permanently.
    ///
    /// Cancels any dial in progress, tears down the live connection and
    /// waits for its tasks. Later calls to [`connect`](Self::connect) and
    /// [`send`](Self::send) fail with [`Error::Shutdown`].
    pub async fn shutdown(&self) {
        self.inner.shutdown().await;
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[inline]
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.is_shutdown()
    }
}

// ============================================================================
// Client - Sending
// ============================================================================

impl Client {
    /// Queues a frame for the write loop.
    ///
    /// Waits while the queue is full. Frames queued while disconnected are
    /// written once a connection is back.
    ///
    /// # Errors
    ///
    /// [`Error::Shutdown`] after shutdown.
    pub async fn send(&self, message: Message) -> Result<()> {
        if self.is_shutdown() {
            return Err(Error::Shutdown);
        }

        self.outbound
            .send(message)
            .await
            .map_err(|_| Error::Shutdown)
    }

    /// Queues a text frame.
    ///
    /// # Errors
    ///
    /// [`Error::Shutdown`] after shutdown.
    #[inline]
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Message::text(text)).await
    }

    /// Queues a binary frame.
    ///
    /// # Errors
    ///
    /// [`Error::Shutdown`] after shutdown.
    #[inline]
    pub async fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        self.send(Message::binary(data)).await
    }

    /// Queues a frame without waiting. Usable from callbacks.
    ///
    /// # Errors
    ///
    /// - [`Error::SendQueueFull`] if the queue has no free slot
    /// - [`Error::Shutdown`] after shutdown
    pub fn try_send(&self, message: Message) -> Result<()> {
        if self.is_shutdown() {
            return Err(Error::Shutdown);
        }

        self.outbound.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => Error::SendQueueFull,
            TrySendError::Closed(_) => Error::Shutdown,
        })
    }
}

// ============================================================================
// Client - Callbacks
// ============================================================================

impl Client {
    /// Replaces the callback run after every successful (re)connection.
    pub fn set_on_connect<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.handlers().set_on_connect(Some(Arc::new(handler)));
    }

    /// Replaces the callback run for every inbound text or binary frame.
    ///
    /// Runs on the read task; a slow callback delays further reads.
    pub fn set_on_receive<F>(&self, handler: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.inner.handlers().set_on_receive(Some(Arc::new(handler)));
    }

    /// Removes the on-connect callback.
    pub fn clear_on_connect(&self) {
        self.inner.handlers().set_on_connect(None);
    }

    /// Removes the on-receive callback. Inbound frames are then dropped.
    pub fn clear_on_receive(&self) {
        self.inner.handlers().set_on_receive(None);
    }
}

// ============================================================================
// Client - Observation
// ============================================================================

impl Client {
    /// Current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Subscribes to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.subscribe_state()
    }

    /// Target endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        self.inner.endpoint()
    }

    /// Effective configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        self.inner.config()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;
    use tokio_test::{assert_err, assert_ok};

    use crate::protocol::FrameType;
    use crate::testing::{FlakyDialer, TestServer, init_tracing, unused_ws_url, wait_until};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn recorder() -> (Arc<Mutex<Vec<Message>>>, impl Fn(Message) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::clone(&seen);
        (seen, move |message| handle.lock().push(message))
    }

    fn fast(url: &str) -> ClientBuilder {
        Client::builder(url)
            .heartbeat_timeout(Duration::from_millis(300))
            .reconnect_delay(Duration::from_millis(50))
            .dial_timeout(Duration::from_secs(2))
    }

    #[test]
    fn test_new_rejects_http_url() {
        let err = Client::new("http://example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_with_headers_rejects_bad_header() {
        let err = Client::with_headers("ws://example.com", [("bad header", "v")]).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[tokio::test]
    async fn test_new_is_idle() {
        let client = assert_ok!(Client::new("ws://127.0.0.1:9"));
        assert_eq!(client.state(), ConnectionState::Idle);
        assert_eq!(client.config(), &Config::default());
        assert_eq!(client.endpoint().url().as_str(), "ws://127.0.0.1:9/");
    }

    #[tokio::test]
    async fn test_connect_after_two_failures() {
        init_tracing();
        let server = TestServer::echo().await;
        let dialer = FlakyDialer::new(2);
        let attempts = dialer.attempts();
        let (connects, on_connect) = counter();

        let client = assert_ok!(
            fast(&server.ws_url())
                .reconnect_delay(Duration::from_millis(100))
                .dialer(dialer)
                .on_connect(on_connect)
                .build()
        );

        let started = Instant::now();
        assert_ok!(client.connect().await);

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(client.state().is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_messages_written_in_order() {
        let mut server = TestServer::echo().await;
        let client = assert_ok!(fast(&server.ws_url()).send_buffer(4).build());
        assert_ok!(client.connect().await);

        for i in 0..50 {
            assert_ok!(client.send_text(format!("msg-{i}")).await);
        }

        for i in 0..50 {
            let recorded = server.next_data_frame().await;
            assert_eq!(recorded.message, Message::text(format!("msg-{i}")));
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_idle_connection_sends_pings() {
        let mut server = TestServer::echo().await;
        let client = assert_ok!(
            Client::builder(server.ws_url())
                .heartbeat_timeout(Duration::from_millis(500))
                .heartbeat_interval(Duration::from_millis(100))
                .build()
        );
        assert_ok!(client.connect().await);

        server.wait_for_pings(1, 3).await;
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let server = TestServer::echo().await;
        let (seen, on_receive) = recorder();
        let client = assert_ok!(fast(&server.ws_url()).on_receive(on_receive).build());
        assert_ok!(client.connect().await);

        assert_ok!(client.send_text("Hello!!!").await);
        assert_ok!(client.send_binary(vec![0_u8, 159, 255]).await);

        wait_until(|| seen.lock().len() == 2).await;
        {
            let seen = seen.lock();
            assert_eq!(seen[0].frame_type(), FrameType::Text);
            assert_eq!(seen[0].payload(), b"Hello!!!");
            assert_eq!(seen[1].frame_type(), FrameType::Binary);
            assert_eq!(seen[1].payload(), &[0_u8, 159, 255]);
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_pongs_reconnect() {
        init_tracing();
        let server = TestServer::silent().await;
        let (connects, on_connect) = counter();
        let client = assert_ok!(fast(&server.ws_url()).on_connect(on_connect).build());

        assert_ok!(client.connect().await);
        wait_until(|| connects.load(Ordering::SeqCst) >= 2).await;
        assert!(server.connection_count() >= 2);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_read_error_reconnects_and_traffic_resumes() {
        let server = TestServer::echo().await;
        let (connects, on_connect) = counter();
        let (seen, on_receive) = recorder();
        let client = assert_ok!(
            fast(&server.ws_url())
                .on_connect(on_connect)
                .on_receive(on_receive)
                .build()
        );

        assert_ok!(client.connect().await);
        server.wait_for_connections(1).await;
        server.drop_connections();

        wait_until(|| connects.load(Ordering::SeqCst) == 2).await;
        assert_ok!(client.send_text("after").await);
        wait_until(|| seen.lock().iter().any(|m| m.as_text() == Some("after"))).await;

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_close_triggers_reconnect() {
        let server = TestServer::echo().await;
        let (connects, on_connect) = counter();
        let client = assert_ok!(fast(&server.ws_url()).on_connect(on_connect).build());

        client.close();
        assert_ok!(client.connect().await);
        client.close();

        wait_until(|| connects.load(Ordering::SeqCst) == 2).await;
        server.wait_for_connections(2).await;
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_permanent() {
        let server = TestServer::echo().await;
        let client = assert_ok!(fast(&server.ws_url()).build());
        assert_ok!(client.connect().await);

        client.shutdown().await;

        assert!(client.is_shutdown());
        assert_eq!(client.state(), ConnectionState::Shutdown);
        assert!(matches!(assert_err!(client.connect().await), Error::Shutdown));
        assert!(matches!(assert_err!(client.send_text("x").await), Error::Shutdown));
        assert!(matches!(assert_err!(client.try_send(Message::text("x"))), Error::Shutdown));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_retry_loop() {
        let url = unused_ws_url().await;
        let client = assert_ok!(fast(&url).build());

        let connecting = tokio::spawn({
            let client = client.clone();
            async move { client.connect().await }
        });

        let mut states = client.state_receiver();
        assert_ok!(
            states
                .wait_for(|state| matches!(state, ConnectionState::Dialing { attempt } if *attempt >= 2))
                .await
        );

        client.shutdown().await;
        assert!(matches!(assert_err!(connecting.await.unwrap()), Error::Shutdown));
    }

    #[tokio::test]
    async fn test_on_connect_can_send() {
        let mut server = TestServer::echo().await;
        let client = assert_ok!(fast(&server.ws_url()).build());

        let handle = client.clone();
        client.set_on_connect(move || {
            let _ = handle.try_send(Message::text("hello from callback"));
        });

        assert_ok!(client.connect().await);
        let recorded = server.next_data_frame().await;
        assert_eq!(recorded.message, Message::text("hello from callback"));

        client.clear_on_connect();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_try_send_reports_full_queue() {
        let client = assert_ok!(Client::builder("ws://127.0.0.1:9").send_buffer(1).build());

        assert_ok!(client.try_send(Message::text("one")));
        let err = assert_err!(client.try_send(Message::text("two")));
        assert!(matches!(err, Error::SendQueueFull));
    }

    #[tokio::test]
    async fn test_drop_cancels_client() {
        let server = TestServer::echo().await;
        let client = assert_ok!(fast(&server.ws_url()).build());
        assert_ok!(client.connect().await);

        let mut states = client.state_receiver();
        drop(client);

        assert_ok!(states.wait_for(|state| state.is_shutdown()).await);
    }
}
