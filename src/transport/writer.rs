//! Write loop: the only task that writes to a connection.
//!
//! Multiplexes caller messages from the handoff queue with heartbeat
//! pings. Any write failure ends the loop, and so does cancellation
//! arriving mid-write. Either way the frame being written is dropped.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::protocol::Message;

use super::disconnect::Disconnect;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on sending the close frame during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Types
// ============================================================================

/// Outbound handoff queue receiver, shared across generations.
///
/// The live write loop holds the lock for its whole lifetime.
pub(crate) type Outbound = Arc<AsyncMutex<mpsc::Receiver<Message>>>;

// ============================================================================
// Write Loop
// ============================================================================

/// Runs the write loop until cancellation, queue closure or a write error.
///
/// The first ping is sent one `heartbeat_interval` after the loop starts.
/// On a requested stop the loop sends a close frame before returning.
pub(crate) async fn run<S>(
    mut sink: S,
    outbound: Outbound,
    heartbeat_interval: Duration,
    token: CancellationToken,
    generation: u64,
) -> Disconnect
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let mut outbound = tokio::select! {
        biased;
        () = token.cancelled() => return Disconnect::Cancelled,
        guard = outbound.lock_owned() => guard,
    };

    let mut ticker = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(generation, interval_ms = heartbeat_interval.as_millis() as u64, "Write loop started");

    let reason = loop {
        tokio::select! {
            // Cancellation first: queued messages stay queued for the next generation.
            biased;

            () = token.cancelled() => break Disconnect::Cancelled,

            message = outbound.recv() => {
                let Some(message) = message else {
                    break Disconnect::QueueClosed;
                };

                trace!(
                    generation,
                    frame_type = %message.frame_type(),
                    len = message.len(),
                    "Writing frame"
                );

                if let Some(reason) = write(&mut sink, message.into_ws(), &token).await {
                    break reason;
                }
            }

            _ = ticker.tick() => {
                trace!(generation, "Writing heartbeat ping");

                let ping = WsMessage::Ping(Vec::new().into());
                if let Some(reason) = write(&mut sink, ping, &token).await {
                    break reason;
                }
            }
        }
    };

    if reason.is_requested() {
        match timeout(CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => trace!(generation, "Close frame sent"),
            Ok(Err(e)) => trace!(generation, error = %e, "Close frame not sent"),
            Err(_) => trace!(generation, "Close frame timed out"),
        }
    }

    debug!(generation, %reason, "Write loop terminated");
    reason
}

/// Writes one frame unless the generation is cancelled first.
///
/// A peer that stops reading parks the write on backpressure; cancellation
/// abandons it and the frame is dropped.
async fn write<S>(sink: &mut S, frame: WsMessage, token: &CancellationToken) -> Option<Disconnect>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Some(Disconnect::Cancelled),
        result = sink.send(frame) => result.err().map(Disconnect::Write),
    }
}

// ============================================================================
// Tests
// ============================================================================
