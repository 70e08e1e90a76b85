//! Connection parameters for one monitored stream

use std::time::Duration;

use crate::{MonitorError, Result};

/// Default NTRIP caster port.
pub const DEFAULT_PORT: u16 = 2101;

/// Default steady-state read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default listener notification cadence.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);

/// Default delay between a failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default timeout for TCP connect and the initial handshake response.
///
/// Separate from [`StreamConfig::read_timeout`]: first-byte latency on some
/// casters is much higher than steady-state inter-message gaps.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection parameters for one NTRIP mountpoint.
///
/// Immutable per session; the supervisor clones what it needs for each
/// connection attempt. Empty credentials are valid and produce a `:`
/// Basic token, leaving rejection to the caster.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Display name used in log output.
    pub name: String,
    /// Caster hostname or address.
    pub host: String,
    /// Caster TCP port.
    pub port: u16,
    /// Mountpoint path (without leading slash).
    pub mountpoint: String,
    /// Basic-auth username, may be empty.
    pub username: String,
    /// Basic-auth password, may be empty.
    pub password: String,
    /// Steady-state read timeout; exceeding it ends the session.
    pub read_timeout: Duration,
    /// Timeout for TCP connect and the initial handshake response.
    pub handshake_timeout: Duration,
    /// Cadence of the periodic listener notification task.
    pub update_interval: Duration,
    /// Delay between a session failure and the next attempt.
    pub reconnect_delay: Duration,
}

impl StreamConfig {
    /// Create a configuration with default timings and no credentials.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        mountpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            mountpoint: mountpoint.into(),
            username: String::new(),
            password: String::new(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Set Basic-auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the steady-state read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the timeout for TCP connect and the initial handshake response.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the listener notification cadence.
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Set the failure-to-retry delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Validate parameter ranges.
    ///
    /// Read timeout must be 5-60s and update interval 10-300s, matching the
    /// ranges the host configuration UI offers. Reconnect delay must be
    /// non-zero so a dead caster cannot turn the retry loop into a busy loop.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(MonitorError::invalid_config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(MonitorError::invalid_config("port must be a valid TCP port"));
        }
        if self.mountpoint.is_empty() {
            return Err(MonitorError::invalid_config("mountpoint must not be empty"));
        }
        let timeout = self.read_timeout.as_secs();
        if !(5..=60).contains(&timeout) {
            return Err(MonitorError::invalid_config(format!(
                "read timeout must be 5-60s, got {timeout}s"
            )));
        }
        let interval = self.update_interval.as_secs();
        if !(10..=300).contains(&interval) {
            return Err(MonitorError::invalid_config(format!(
                "update interval must be 10-300s, got {interval}s"
            )));
        }
        if self.handshake_timeout.is_zero() {
            return Err(MonitorError::invalid_config("handshake timeout must be non-zero"));
        }
        if self.reconnect_delay.is_zero() {
            return Err(MonitorError::invalid_config("reconnect delay must be non-zero"));
        }
        Ok(())
    }
}
