//! Error types for the persistent WebSocket client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```no_run
//! use persistent_ws::{Client, Result};
//!
//! async fn example() -> Result<()> {
//!     let client = Client::new("wss://echo.example.com")?;
//!     client.connect().await?;
//!     client.send_text("hello").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Surfaced to caller |
//! |----------|----------|--------------------|
//! | Construction | [`Error::InvalidUrl`], [`Error::InvalidHeader`], [`Error::Config`], [`Error::InvalidFrame`] | Yes, synchronously |
//! | Dial | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::WebSocket`] | No, logged and retried |
//! | Lifecycle | [`Error::Shutdown`], [`Error::SendQueueFull`] | Yes |
//!
//! Read and write failures on a live connection are never returned to the
//! caller. They tear the connection down and start a new dial.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::protocol::FrameType;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// Endpoint URL is malformed or not a WebSocket URL.
    ///
    /// Returned when the client is constructed.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why the URL was rejected.
        message: String,
    },

    /// Handshake header name or value is invalid.
    #[error("Invalid header '{name}': {message}")]
    InvalidHeader {
        /// The header name as supplied.
        name: String,
        /// Why the header was rejected.
        message: String,
    },

    /// Configuration error.
    ///
    /// Returned when client configuration is inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Message payload does not fit its frame type.
    #[error("Invalid {frame_type} frame: {message}")]
    InvalidFrame {
        /// Frame type of the rejected message.
        frame_type: FrameType,
        /// Why the payload was rejected.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Dial did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Client was shut down and will not reconnect.
    #[error("Client shut down")]
    Shutdown,

    /// Outbound queue is full.
    ///
    /// Only returned by non-waiting sends.
    #[error("Send queue full")]
    SendQueueFull,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid header error.
    #[inline]
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid frame error.
    #[inline]
    pub fn invalid_frame(frame_type: FrameType, message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            frame_type,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error was raised while building a client.
    #[inline]
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::InvalidHeader { .. }
                | Self::Config { .. }
                | Self::InvalidFrame { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::Io(_)
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the client has been shut down.
    #[inline]
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown)
    }
}

// ============================================================================
// Tests
// ============================================================================
