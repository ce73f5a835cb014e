//! Read loop: the only task that reads from a connection.
//!
//! Owns the read deadline. Every pong pushes the deadline out by the
//! heartbeat timeout; if it passes with no pong the loop ends and the
//! connection is considered dead.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::protocol::Message;

use super::disconnect::Disconnect;
use super::handlers::Handlers;

// ============================================================================
// Read Loop
// ============================================================================

/// Runs the read loop until cancellation, a read failure or deadline expiry.
///
/// Text and binary frames go to the receive handler. Pings are answered by
/// the transport itself and are not forwarded.
pub(crate) async fn run<R>(
    mut stream: R,
    handlers: Arc<Handlers>,
    heartbeat_timeout: Duration,
    token: CancellationToken,
    generation: u64,
) -> Disconnect
where
    R: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    let mut deadline = Instant::now() + heartbeat_timeout;

    debug!(generation, timeout_ms = heartbeat_timeout.as_millis() as u64, "Read loop started");

    let reason = loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break Disconnect::Cancelled,
            next = timeout_at(deadline, stream.next()) => next,
        };

        let frame = match next {
            Err(_) => break Disconnect::DeadlineExceeded(heartbeat_timeout),
            Ok(None) => break Disconnect::StreamEnded,
            Ok(Some(Err(e))) => break Disconnect::Read(e),
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            WsMessage::Pong(_) => {
                deadline = Instant::now() + heartbeat_timeout;
                trace!(generation, "Pong received, read deadline extended");
            }

            WsMessage::Ping(_) => {
                trace!(generation, "Ping received");
            }

            WsMessage::Close(frame) => {
                debug!(generation, ?frame, "Close frame received");
                break Disconnect::PeerClosed;
            }

            WsMessage::Frame(_) => {}

            data => {
                let Some(message) = Message::from_ws(data) else {
                    continue;
                };

                trace!(
                    generation,
                    frame_type = %message.frame_type(),
                    len = message.len(),
                    "Frame received"
                );

                if !handlers.received(message) {
                    trace!(generation, "No receive handler, frame dropped");
                }
            }
        }
    };

    debug!(generation, %reason, "Read loop terminated");
    reason
}

// ============================================================================
// Tests
// ============================================================================
