//! WebSocket frame and endpoint types.
//!
//! # Frames
//!
//! | Frame Type | Direction | Handling |
//! |------------|-----------|----------|
//! | `Text` | Both | Forwarded to the receive callback |
//! | `Binary` | Both | Forwarded to the receive callback |
//! | `Ping` | Both | Sent by the heartbeat; inbound answered by the transport |
//! | `Pong` | Both | Inbound extends the read deadline |
//! | `Close` | Both | Inbound ends the connection generation |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `endpoint` | Validated target URL and handshake headers |
//! | `message` | Frame type and payload |

// ============================================================================
// Submodules
// ============================================================================

/// Target URL and handshake headers.
pub mod endpoint;

/// WebSocket frame types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::Endpoint;
pub use message::{FrameType, Message};
