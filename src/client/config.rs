//! Heartbeat, reconnect and queue settings.
//!
//! Defaults reproduce the classic gorilla-style keepalive: a 60 second
//! pong wait, pings every 9/10 of it, and a flat 2 second pause between
//! dial attempts.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use persistent_ws::Config;
//!
//! let config = Config::new()
//!     .with_heartbeat_timeout(Duration::from_secs(30))
//!     .with_reconnect_delay(Duration::from_millis(500));
//!
//! assert_eq!(config.heartbeat_interval(), Duration::from_secs(27));
//! assert!(config.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time allowed between pongs before the connection is dead.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default pause between failed dial attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Default upper bound on a single dial and handshake.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(45);

/// Default capacity of the outbound handoff queue.
pub const DEFAULT_SEND_BUFFER: usize = 32;

/// Heartbeat interval as a fraction of the timeout (numerator / denominator).
const HEARTBEAT_RATIO: (u32, u32) = (9, 10);

// ============================================================================
// Config
// ============================================================================

/// Client behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Read deadline extension granted by each pong.
    pub heartbeat_timeout: Duration,

    /// Ping period. `None` derives it as 9/10 of `heartbeat_timeout`.
    pub heartbeat_interval: Option<Duration>,

    /// Flat delay between dial attempts.
    pub reconnect_delay: Duration,

    /// Upper bound on one dial attempt including the handshake.
    pub dial_timeout: Duration,

    /// Capacity of the outbound handoff queue.
    pub send_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Config {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            heartbeat_interval: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            send_buffer: DEFAULT_SEND_BUFFER,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Config {
    /// Sets the heartbeat timeout.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Overrides the derived ping period.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Sets the delay between dial attempts.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the dial timeout.
    #[inline]
    #[must_use]
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Sets the outbound queue capacity.
    #[inline]
    #[must_use]
    pub fn with_send_buffer(mut self, capacity: usize) -> Self {
        self.send_buffer = capacity;
        self
    }
}

// ============================================================================
// Derived Values & Validation
// ============================================================================

impl Config {
    /// Returns the effective ping period.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval.unwrap_or_else(|| {
            let (num, den) = HEARTBEAT_RATIO;
            self.heartbeat_timeout * num / den
        })
    }

    /// Checks that the settings can drive a connection.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_timeout.is_zero() {
            return Err(Error::config("heartbeat_timeout must be greater than zero"));
        }

        let interval = self.heartbeat_interval();
        if interval.is_zero() {
            return Err(Error::config("heartbeat_interval must be greater than zero"));
        }
        if interval >= self.heartbeat_timeout {
            return Err(Error::config(format!(
                "heartbeat_interval ({interval:?}) must be shorter than heartbeat_timeout ({:?})",
                self.heartbeat_timeout
            )));
        }

        if self.dial_timeout.is_zero() {
            return Err(Error::config("dial_timeout must be greater than zero"));
        }

        if self.send_buffer == 0 {
            return Err(Error::config("send_buffer must be at least 1"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
