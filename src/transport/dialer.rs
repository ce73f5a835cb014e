//! Opening new transport connections.
//!
//! The supervisor never talks to the network directly. It asks a
//! [`Dialer`] for a fresh [`WsStream`] on every attempt, which keeps the
//! retry policy independent of how sockets are opened.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::trace;

use crate::error::Result;
use crate::protocol::Endpoint;

// ============================================================================
// Types
// ============================================================================

/// Transport handle produced by a successful dial.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Dialer
// ============================================================================

/// Opens one WebSocket connection to an endpoint.
///
/// Implementations perform a single attempt. Retrying, delays and timeouts
/// belong to the caller.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Dials the endpoint and completes the opening handshake.
    async fn dial(&self, endpoint: &Endpoint) -> Result<WsStream>;
}

// ============================================================================
// TungsteniteDialer
// ============================================================================

/// Default dialer backed by `tokio-tungstenite`.
///
/// Plain `ws://` targets use TCP, `wss://` targets use rustls with the
/// platform's native roots.
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteDialer;

#[async_trait]
impl Dialer for TungsteniteDialer {
    async fn dial(&self, endpoint: &Endpoint) -> Result<WsStream> {
        let request = endpoint.handshake_request()?;
        let (stream, response) = connect_async(request).await?;

        trace!(status = %response.status(), url = %endpoint, "Handshake completed");

        Ok(stream)
    }
}

// ============================================================================
// Tests
// ============================================================================
