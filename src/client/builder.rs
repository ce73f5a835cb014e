//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use persistent_ws::Client;
//!
//! # fn example() -> persistent_ws::Result<()> {
//! let client = Client::builder("ws://127.0.0.1:8080/ws")
//!     .header("X-Api-Key", "secret")
//!     .heartbeat_timeout(Duration::from_secs(30))
//!     .reconnect_delay(Duration::from_millis(500))
//!     .on_connect(|| println!("connected"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{Endpoint, Message};
use crate::transport::{ConnectHandler, Dialer, Handlers, ReceiveHandler, TungsteniteDialer};

use super::config::Config;
use super::core::Client;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder. Nothing is validated
/// until [`build`](Self::build).
#[derive(Clone)]
pub struct ClientBuilder {
    /// Target URL, parsed at build time.
    url: String,
    /// Handshake headers in insertion order.
    headers: Vec<(String, String)>,
    /// Behaviour settings.
    config: Config,
    /// Custom dialer. `None` uses [`TungsteniteDialer`].
    dialer: Option<Arc<dyn Dialer>>,
    on_connect: Option<ConnectHandler>,
    on_receive: Option<ReceiveHandler>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("url", &self.url)
            .field("headers", &self.headers.len())
            .field("config", &self.config)
            .field("custom_dialer", &self.dialer.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder for `url` with default settings.
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            config: Config::default(),
            dialer: None,
            on_connect: None,
            on_receive: None,
        }
    }

    /// Adds a header sent with every handshake.
    ///
    /// Repeating a name sends it several times.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces all behaviour settings at once.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets how long a connection may go without a pong.
    #[inline]
    #[must_use]
    pub fn heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.config.heartbeat_timeout = timeout;
        self
    }

    /// Sets the ping period explicitly.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = Some(interval);
        self
    }

    /// Sets the pause between dial attempts.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Sets the upper bound on one dial attempt.
    #[inline]
    #[must_use]
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.config.dial_timeout = timeout;
        self
    }

    /// Sets the outbound queue capacity.
    #[inline]
    #[must_use]
    pub fn send_buffer(mut self, capacity: usize) -> Self {
        self.config.send_buffer = capacity;
        self
    }

    /// Replaces the transport dialer.
    #[inline]
    #[must_use]
    pub fn dialer(mut self, dialer: impl Dialer) -> Self {
        self.dialer = Some(Arc::new(dialer));
        self
    }

    /// Sets the callback run after every successful (re)connection.
    #[inline]
    #[must_use]
    pub fn on_connect<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connect = Some(Arc::new(handler));
        self
    }

    /// Sets the callback run for every inbound text or binary frame.
    #[inline]
    #[must_use]
    pub fn on_receive<F>(mut self, handler: F) -> Self
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.on_receive = Some(Arc::new(handler));
        self
    }

    /// Builds the client with validation. Does not dial.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`](crate::Error::InvalidUrl) if the URL is not `ws://` or `wss://`
    /// - [`Error::InvalidHeader`](crate::Error::InvalidHeader) if a header name or value is invalid
    /// - [`Error::Config`](crate::Error::Config) if the settings are inconsistent
    pub fn build(self) -> Result<Client> {
        let headers = self.headers.iter().map(|(name, value)| (name, value));
        let endpoint = Endpoint::with_headers(&self.url, headers)?;
        self.config.validate()?;

        let handlers = Handlers::default();
        handlers.set_on_connect(self.on_connect);
        handlers.set_on_receive(self.on_receive);

        let dialer = self.dialer.unwrap_or_else(|| Arc::new(TungsteniteDialer));

        Ok(Client::from_parts(endpoint, self.config, dialer, handlers))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    #[test]
    fn test_new_uses_defaults() {
        let builder = ClientBuilder::new("ws://localhost");
        assert_eq!(builder.config, Config::default());
        assert!(builder.headers.is_empty());
        assert!(builder.dialer.is_none());
    }

    #[test]
    fn test_setters_update_config() {
        let builder = ClientBuilder::new("ws://localhost")
            .heartbeat_timeout(Duration::from_secs(10))
            .heartbeat_interval(Duration::from_secs(3))
            .reconnect_delay(Duration::from_millis(250))
            .dial_timeout(Duration::from_secs(5))
            .send_buffer(8);

        assert_eq!(builder.config.heartbeat_timeout, Duration::from_secs(10));
        assert_eq!(builder.config.heartbeat_interval(), Duration::from_secs(3));
        assert_eq!(builder.config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(builder.config.dial_timeout, Duration::from_secs(5));
        assert_eq!(builder.config.send_buffer, 8);
    }

    #[test]
    fn test_headers_keep_order_and_duplicates() {
        let builder = ClientBuilder::new("ws://localhost")
            .header("X-A", "1")
            .header("X-A", "2");
        assert_eq!(
            builder.headers,
            vec![("X-A".to_string(), "1".to_string()), ("X-A".to_string(), "2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_build_applies_headers() {
        let client = ClientBuilder::new("wss://example.com/feed")
            .header("Authorization", "Bearer abc")
            .build()
            .unwrap();

        assert!(client.endpoint().is_secure());
        assert_eq!(client.endpoint().headers()["authorization"], "Bearer abc");
    }

    #[test]
    fn test_build_rejects_bad_url() {
        let err = ClientBuilder::new("not a url").build().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_build_rejects_bad_header_value() {
        let err = ClientBuilder::new("ws://localhost")
            .header("X-Bad", "line\nbreak")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let err = ClientBuilder::new("ws://localhost")
            .heartbeat_timeout(Duration::from_secs(1))
            .heartbeat_interval(Duration::from_secs(2))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = ClientBuilder::new("ws://localhost")
            .send_buffer(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
