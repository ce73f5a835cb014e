//! Observable connection lifecycle state.

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the client is in its dial/connect/close cycle.
///
/// ```text
/// Idle ──► Dialing ──► Connected ──► Closing ──► Dialing ──► ...
///              │            │            │
///              └────────────┴────────────┴──► Shutdown
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, `connect` not called yet.
    Idle,
    /// Dial attempt in progress (1-based, reset after each success).
    Dialing {
        /// Attempt number since the last successful connection.
        attempt: u32,
    },
    /// Read and write loops are running.
    Connected {
        /// Connection generation, starting at 1.
        generation: u64,
    },
    /// Loops are being torn down; a new dial follows.
    Closing {
        /// Generation being torn down.
        generation: u64,
    },
    /// Shut down permanently.
    Shutdown,
}

impl ConnectionState {
    /// Returns `true` if a connection is live.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Returns `true` once the client has shut down.
    #[inline]
    #[must_use]
    pub const fn is_shutdown(self) -> bool {
        matches!(self, Self::Shutdown)
    }

    /// Returns the generation for connected or closing states.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> Option<u64> {
        match self {
            Self::Connected { generation } | Self::Closing { generation } => Some(generation),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
