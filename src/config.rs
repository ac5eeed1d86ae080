//! Configuration for revtree connections
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::protocol::{DEFAULT_MAX_MESSAGE_SIZE, MAX_FRAME_LEN};

/// Settings applied when a connection is established
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Dial Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on TCP connection establishment, per resolved address.
    /// `None` waits for the operating system's own timeout.
    pub dial_timeout: Option<Duration>,

    /// Disable Nagle's algorithm on the connection
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Largest encoded request accepted for sending (in bytes)
    pub max_message_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dial_timeout: None,
            nodelay: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the dial timeout
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.config.dial_timeout = Some(timeout);
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the maximum encoded request size (in bytes)
    ///
    /// Capped at the largest length a frame prefix can carry.
    pub fn max_message_size(mut self, bytes: u64) -> Self {
        self.config.max_message_size = bytes.min(MAX_FRAME_LEN);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
