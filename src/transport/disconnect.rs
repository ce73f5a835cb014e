//! Why a connection generation ended.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Disconnect
// ============================================================================

/// Reason a read or write loop returned.
///
/// Never surfaced to callers; used for logging and teardown decisions.
#[derive(Debug)]
pub(crate) enum Disconnect {
    /// Generation was cancelled by `close`, `shutdown`, or the sibling loop.
    Cancelled,
    /// Peer sent a close frame.
    PeerClosed,
    /// Inbound stream ended without a close frame.
    StreamEnded,
    /// No pong arrived before the read deadline.
    DeadlineExceeded(Duration),
    /// Reading a frame failed.
    Read(WsError),
    /// Writing a frame failed. The frame is dropped.
    Write(WsError),
    /// Every sender of the outbound queue is gone.
    QueueClosed,
    /// A loop task panicked or was aborted.
    Aborted(String),
}

impl Disconnect {
    /// Returns `true` if the generation ended because it was asked to.
    #[inline]
    pub(crate) fn is_requested(&self) -> bool {
        matches!(self, Self::Cancelled | Self::QueueClosed)
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::PeerClosed => f.write_str("closed by peer"),
            Self::StreamEnded => f.write_str("stream ended"),
            Self::DeadlineExceeded(timeout) => {
                write!(f, "no pong within {}ms", timeout.as_millis())
            }
            Self::Read(e) => write!(f, "read failed: {e}"),
            Self::Write(e) => write!(f, "write failed: {e}"),
            Self::QueueClosed => f.write_str("send queue closed"),
            Self::Aborted(reason) => write!(f, "loop aborted: {reason}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
