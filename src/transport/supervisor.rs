//! Connection supervisor: dial, retry, generation lifecycle, reconnect.
//!
//! # Generations
//!
//! Every successful dial starts a new *generation*: one transport handle,
//! split into a sink owned by the write loop and a stream owned by the read
//! loop. A dedicated task waits for either loop to return, cancels the
//! other, waits for it, and only then dials again. At most one handle is
//! open at any instant and no loop ever sees a handle from another
//! generation.
//!
//! ```text
//!  connect() ──► dial ──ok──► start() ──► generation task
//!     ▲           │                       ├─► read loop  ─┐
//!     │          err                      └─► write loop ─┤ first to return
//!     │           ▼                                       ▼
//!     │     sleep(reconnect_delay)              cancel + join both
//!     └───────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation is hierarchical: the client's root token parents every
//! generation token, so shutdown reaches the live loops and any dial or
//! retry sleep in progress.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::Config;
use crate::error::{Error, Result};
use crate::protocol::{Endpoint, Message};

use super::dialer::{Dialer, WsStream};
use super::disconnect::Disconnect;
use super::handlers::Handlers;
use super::state::ConnectionState;
use super::writer::Outbound;
use super::{reader, writer};

// ============================================================================
// Generation
// ============================================================================

/// Bookkeeping for the live connection generation.
struct Generation {
    /// Generation number, starting at 1.
    id: u64,
    /// Cancels both loops of this generation.
    token: CancellationToken,
    /// Task supervising the two loops.
    task: JoinHandle<()>,
}

// ============================================================================
// Supervisor
// ============================================================================

/// Owns the transport lifecycle for one client.
pub(crate) struct Supervisor {
    endpoint: Endpoint,
    config: Config,
    dialer: Arc<dyn Dialer>,
    handlers: Arc<Handlers>,
    outbound: Outbound,
    shutdown: CancellationToken,
    /// Serializes dialing so only one `connect` runs at a time.
    dial_lock: AsyncMutex<()>,
    current: Mutex<Option<Generation>>,
    /// Signalled once a generation's loops are joined and its slot cleared.
    teardown: Notify,
    generations: AtomicU64,
    state: watch::Sender<ConnectionState>,
}

// ============================================================================
// Supervisor - Constructor & Accessors
// ============================================================================

impl Supervisor {
    /// Creates a supervisor and the receiving end of the handoff queue.
    ///
    /// Returns the queue's sender; the caller hands it to the facade.
    pub(crate) fn new(
        endpoint: Endpoint,
        config: Config,
        dialer: Arc<dyn Dialer>,
        handlers: Arc<Handlers>,
        shutdown: CancellationToken,
    ) -> (Arc<Self>, mpsc::Sender<Message>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.send_buffer);
        let (state, _) = watch::channel(ConnectionState::Idle);

        let supervisor = Arc::new(Self {
            endpoint,
            config,
            dialer,
            handlers,
            outbound: Arc::new(AsyncMutex::new(outbound_rx)),
            shutdown,
            dial_lock: AsyncMutex::new(()),
            current: Mutex::new(None),
            teardown: Notify::new(),
            generations: AtomicU64::new(0),
            state,
        });

        (supervisor, outbound_tx)
    }

    #[inline]
    pub(crate) fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[inline]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub(crate) fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    #[inline]
    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    #[inline]
    pub(crate) fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    #[inline]
    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Publishes a state change. `Shutdown` is terminal.
    fn set_state(&self, state: ConnectionState) {
        self.state.send_if_modified(|current| {
            if current.is_shutdown() || *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}

// ============================================================================
// Supervisor - Connect / Close / Shutdown
// ============================================================================

impl Supervisor {
    /// Dials until a connection is established, then starts its loops.
    ///
    /// Retries every `reconnect_delay` with no attempt limit. Returns
    /// immediately if a generation is already live. A generation that is
    /// closing is waited out first, then replaced.
    ///
    /// # Errors
    ///
    /// [`Error::Shutdown`] once the client is shut down.
    pub(crate) async fn connect(self: &Arc<Self>) -> Result<()> {
        let result = self.dial_until_connected().await;
        if matches!(result, Err(Error::Shutdown)) {
            self.set_state(ConnectionState::Shutdown);
        }
        result
    }

    async fn dial_until_connected(self: &Arc<Self>) -> Result<()> {
        let dialing = self.dial_lock.lock().await;

        if self.settle_current().await? {
            debug!("Already connected, skipping dial");
            return Ok(());
        }

        let mut attempt: u32 = 0;

        loop {
            if self.is_shutdown() {
                return Err(Error::Shutdown);
            }

            attempt = attempt.saturating_add(1);
            self.set_state(ConnectionState::Dialing { attempt });

            match self.dial().await {
                Ok(stream) => {
                    let generation = self.start(stream)?;
                    drop(dialing);

                    info!(generation, attempt, url = %self.endpoint, "Connection established");
                    self.handlers.connected();
                    return Ok(());
                }

                Err(Error::Shutdown) => return Err(Error::Shutdown),

                Err(e) => {
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = self.config.reconnect_delay.as_millis() as u64,
                        url = %self.endpoint,
                        "Could not connect, retrying"
                    );

                    tokio::select! {
                        () = self.shutdown.cancelled() => return Err(Error::Shutdown),
                        () = sleep(self.config.reconnect_delay) => {}
                    }
                }
            }
        }
    }

    /// Waits until no closing generation remains.
    ///
    /// Returns `true` if a live generation occupies the slot.
    async fn settle_current(&self) -> Result<bool> {
        loop {
            // Registered before the check so a teardown in between is not missed.
            let torn_down = self.teardown.notified();

            let live = self
                .current
                .lock()
                .as_ref()
                .map(|generation| !generation.token.is_cancelled());

            match live {
                None => return Ok(false),
                Some(true) => return Ok(true),
                Some(false) => {
                    debug!("Waiting for closing connection to be torn down");
                    tokio::select! {
                        () = self.shutdown.cancelled() => return Err(Error::Shutdown),
                        () = torn_down => {}
                    }
                }
            }
        }
    }

    /// One dial attempt bounded by `dial_timeout` and shutdown.
    async fn dial(&self) -> Result<WsStream> {
        let dial_timeout = self.config.dial_timeout;

        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(Error::Shutdown),
            result = timeout(dial_timeout, self.dialer.dial(&self.endpoint)) => {
                result.map_err(|_| Error::connection_timeout(dial_timeout.as_millis() as u64))?
            }
        }
    }

    /// Registers a new generation and spawns its supervising task.
    fn start(self: &Arc<Self>, stream: WsStream) -> Result<u64> {
        let mut current = self.current.lock();

        // Checked under the lock so `shutdown` either sees this generation or
        // this call sees the cancellation.
        if self.is_shutdown() {
            return Err(Error::Shutdown);
        }

        let id = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let token = self.shutdown.child_token();
        let task = tokio::spawn(Arc::clone(self).run_generation(id, stream, token.clone()));

        *current = Some(Generation { id, token, task });
        self.set_state(ConnectionState::Connected { generation: id });

        Ok(id)
    }

    /// Closes the live connection, if any. A reconnect follows.
    pub(crate) fn close(&self) {
        if let Some(generation) = self.current.lock().as_ref() {
            debug!(generation = generation.id, "Close requested");
            generation.token.cancel();
        }
    }

    /// Stops permanently: no further dials, live loops torn down.
    ///
    /// Pending and future sends fail with [`Error::Shutdown`].
    pub(crate) async fn shutdown(&self) {
        self.shutdown.cancel();

        let task = self.current.lock().take().map(|generation| generation.task);
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Generation task failed during shutdown");
        }

        self.outbound.lock().await.close();
        self.set_state(ConnectionState::Shutdown);
        info!(url = %self.endpoint, "Client shut down");
    }
}

// ============================================================================
// Supervisor - Generation Task
// ============================================================================

impl Supervisor {
    /// Runs one generation to completion, then reconnects unless shut down.
    async fn run_generation(
        self: Arc<Self>,
        id: u64,
        stream: WsStream,
        token: CancellationToken,
    ) {
        let (sink, stream) = stream.split();

        let mut write_task = tokio::spawn(writer::run(
            sink,
            Arc::clone(&self.outbound),
            self.config.heartbeat_interval(),
            token.clone(),
            id,
        ));
        let mut read_task = tokio::spawn(reader::run(
            stream,
            Arc::clone(&self.handlers),
            self.config.heartbeat_timeout,
            token.clone(),
            id,
        ));

        let (first, read_finished) = tokio::select! {
            result = &mut read_task => (joined(result), true),
            result = &mut write_task => (joined(result), false),
        };

        self.set_state(ConnectionState::Closing { generation: id });
        token.cancel();

        let second = if read_finished {
            joined(write_task.await)
        } else {
            joined(read_task.await)
        };

        // Both halves are dropped at this point: the handle is fully closed.
        self.current.lock().take_if(|generation| generation.id == id);
        self.teardown.notify_waiters();

        if first.is_requested() {
            info!(generation = id, reason = %first, "Connection closed");
        } else {
            warn!(generation = id, reason = %first, then = %second, "Connection lost");
        }

        if self.is_shutdown() {
            self.set_state(ConnectionState::Shutdown);
            return;
        }

        if let Err(e) = self.connect().await {
            debug!(generation = id, error = %e, "Reconnect abandoned");
        }
    }
}

/// Flattens a loop task's join result into a disconnect reason.
fn joined(result: std::result::Result<Disconnect, tokio::task::JoinError>) -> Disconnect {
    result.unwrap_or_else(|e| Disconnect::Aborted(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
