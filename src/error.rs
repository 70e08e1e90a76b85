//! Error types for stream monitoring.
//!
//! All failures a connection attempt or a live stream can produce are
//! collected in [`MonitorError`]. The supervisor treats every retryable
//! variant the same way: record the message, mark the stream disconnected,
//! wait the configured delay, reconnect.
//!
//! ## Error Categories
//!
//! - **Setup failures**: TCP connect refused/timed out, non-200 handshake
//!   response, server closing without responding
//! - **Streaming failures**: idle read timeout, peer close, transport I/O
//! - **Configuration errors**: invalid connection parameters (never retried)

use std::time::Duration;
use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T, E = MonitorError> = std::result::Result<T, E>;

/// Main error type for NTRIP connection and streaming operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MonitorError {
    #[error("Failed to connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("NTRIP server rejected connection: {line}")]
    Handshake { line: String },

    #[error("Server closed connection without sending a response")]
    EmptyResponse,

    #[error("No data received within {timeout:?}")]
    IdleTimeout { timeout: Duration },

    #[error("Stream closed by server")]
    PeerClosed,

    #[error("Transport I/O error")]
    Io(#[from] std::io::Error),

    #[error("Invalid stream configuration: {reason}")]
    Config { reason: String },
}

impl MonitorError {
    /// Returns whether this error is recoverable by reconnecting.
    ///
    /// Everything except a configuration error is transient from the
    /// supervisor's point of view: the caster may come back, credentials may
    /// start being accepted, the network may heal. A bad configuration will
    /// fail identically forever.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, MonitorError::Config { .. })
    }

    /// Helper constructor for connect failures.
    pub fn connect_failed(
        host: impl Into<String>,
        port: u16,
        reason: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        MonitorError::Connect { host: host.into(), port, reason: reason.into(), source }
    }

    /// Helper constructor for handshake rejections, carrying the status line.
    pub fn handshake_rejected(line: impl Into<String>) -> Self {
        MonitorError::Handshake { line: line.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        MonitorError::Config { reason: reason.into() }
    }
}
