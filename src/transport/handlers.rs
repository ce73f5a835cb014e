//! Consumer callbacks shared between the facade and the loops.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;

use crate::protocol::Message;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked after every successful (re)connection.
pub type ConnectHandler = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked for every inbound text or binary frame.
pub type ReceiveHandler = Arc<dyn Fn(Message) + Send + Sync>;

// ============================================================================
// Handlers
// ============================================================================

/// Replaceable callback slots.
///
/// Handlers are cloned out of the lock before being called, so a callback
/// may replace or clear handlers without deadlocking.
#[derive(Default)]
pub(crate) struct Handlers {
    on_connect: Mutex<Option<ConnectHandler>>,
    on_receive: Mutex<Option<ReceiveHandler>>,
}

impl Handlers {
    pub(crate) fn set_on_connect(&self, handler: Option<ConnectHandler>) {
        *self.on_connect.lock() = handler;
    }

    pub(crate) fn set_on_receive(&self, handler: Option<ReceiveHandler>) {
        *self.on_receive.lock() = handler;
    }

    /// Invokes the connect handler, if any.
    pub(crate) fn connected(&self) {
        let handler = self.on_connect.lock().clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Invokes the receive handler, if any. Returns `false` if none is set.
    pub(crate) fn received(&self, message: Message) -> bool {
        let handler = self.on_receive.lock().clone();
        match handler {
            Some(handler) => {
                handler(message);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
