//! WebSocket transport layer.
//!
//! Owns the connection lifecycle behind [`Client`](crate::Client).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  send   ┌───────────────┐         ┌─────────────┐
//! │    Client    │────────►│ handoff queue │────────►│ Write Loop  │──┐
//! └──────┬───────┘         └───────────────┘  pings  └─────────────┘  │
//!        │ connect / close / shutdown                                 ▼
//! ┌──────▼───────┐  dial   ┌───────────────┐                     ┌────────┐
//! │  Supervisor  │────────►│    Dialer     │────────────────────►│ Server │
//! └──────────────┘         └───────────────┘                     └────────┘
//!        ▲ generation ends   ┌─────────────┐  on_receive            │
//!        └───────────────────│  Read Loop  │◄───────────────────────┘
//!                            └─────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Supervisor::connect` - dial with flat retry until success
//! 2. Spawn the read and write loops for the new generation
//! 3. Either loop returns - cancel the other, join both
//! 4. Redial unless the client was shut down
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `dialer` | Dialer seam and tungstenite implementation |
//! | `disconnect` | Reasons a generation ended |
//! | `handlers` | Consumer callback slots |
//! | `reader` | Read loop and read deadline |
//! | `state` | Observable connection state |
//! | `supervisor` | Dial, retry and generation lifecycle |
//! | `writer` | Write loop and heartbeat |

// ============================================================================
// Submodules
// ============================================================================

/// Dialer trait and default implementation.
pub mod dialer;

mod disconnect;

mod handlers;

mod reader;

/// Connection state reporting.
pub mod state;

mod supervisor;

mod writer;

// ============================================================================
// Re-exports
// ============================================================================

pub use dialer::{Dialer, TungsteniteDialer, WsStream};
pub use handlers::{ConnectHandler, ReceiveHandler};
pub use state::ConnectionState;

pub(crate) use handlers::Handlers;
pub(crate) use supervisor::Supervisor;
