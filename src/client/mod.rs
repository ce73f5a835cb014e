//! Public client API.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Cloneable handle to a self-healing connection |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`Config`] | Heartbeat, reconnect and queue settings |
//!
//! # Example
//!
//! ```no_run
//! use persistent_ws::{Client, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder("ws://127.0.0.1:8080/ws")
//!     .on_connect(|| println!("connected"))
//!     .build()?;
//!
//! client.connect().await?;
//! client.send_text("Hello!!!").await?;
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Behaviour settings and defaults.
pub mod config;

/// Client handle implementation.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use config::{
    Config, DEFAULT_DIAL_TIMEOUT, DEFAULT_HEARTBEAT_TIMEOUT, DEFAULT_RECONNECT_DELAY,
    DEFAULT_SEND_BUFFER,
};
pub use core::Client;
