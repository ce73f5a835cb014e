//! Persistent WebSocket - self-healing WebSocket client.
//!
//! Keeps one logical WebSocket connection to a server alive for as long as
//! the caller wants it. Dropped connections, failed reads and writes, and
//! missed heartbeats are all recovered from by dialing again.
//!
//! # Architecture
//!
//! - **Client**: cloneable handle; enqueues outbound frames, owns callbacks
//! - **Supervisor**: dials with a flat retry delay, runs one generation at a time
//! - **Loops**: exactly one reader and one writer per generation
//!
//! Key design principles:
//!
//! - At most one transport handle is open at any instant
//! - Messages queued while disconnected are written after reconnecting
//! - Heartbeat pings every 9/10 of the pong timeout; a missed pong redials
//! - Permanent stop through a cancellation token (`shutdown` or drop)
//!
//! # Quick Start
//!
//! ```no_run
//! use persistent_ws::{Client, Message, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder("wss://stream.example.com/feed")
//!         .on_connect(|| println!("connected"))
//!         .on_receive(|message: Message| println!("received {} bytes", message.len()))
//!         .build()?;
//!
//!     // Returns once connected, retrying every 2 seconds until then
//!     client.connect().await?;
//!     client.send_text("Hello!!!").await?;
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], [`ClientBuilder`] and [`Config`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Frame and endpoint types |
//! | [`transport`] | Dialer seam, connection state, loops (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Client handle, builder and configuration.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// WebSocket frame and endpoint types.
pub mod protocol;

/// WebSocket transport layer.
///
/// Connection supervision and the per-connection read and write loops.
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, Config};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{Endpoint, FrameType, Message};

// Transport types
pub use transport::{
    ConnectHandler, ConnectionState, Dialer, ReceiveHandler, TungsteniteDialer, WsStream,
};
