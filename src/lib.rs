//! Async NTRIP client that supervises an RTCM3 correction stream.
//!
//! ntrip-monitor connects to an NTRIP v1 caster mountpoint, decodes the
//! RTCM3 frames it delivers, and keeps the connection alive indefinitely
//! across timeouts, peer closes, and malformed data. It does not decode
//! message bodies; it reports framing-level telemetry per message (id,
//! payload length, satellite counts for the observation families) and an
//! aggregate [`StreamStatus`] for external consumers.
//!
//! # Architecture
//!
//! - [`rtcm`] - streaming frame decoder and satellite-count extractors
//! - [`NtripSession`] - one TCP connection: handshake plus a pull-based
//!   message sequence
//! - [`StreamMonitor`] - retry-forever supervisor aggregating status and
//!   fanning out change notifications
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ntrip_monitor::{StreamConfig, StreamMonitor};
//!
//! #[tokio::main]
//! async fn main() -> ntrip_monitor::Result<()> {
//!     let config = StreamConfig::new("base", "rtk.example.com", 2101, "MOUNT1")
//!         .with_credentials("user", "pass");
//!
//!     let monitor = StreamMonitor::new(config)?;
//!     monitor.start();
//!     let _id = monitor.register_listener(|| {
//!         // status changed; pull a snapshot from the monitor
//!     });
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     let status = monitor.status();
//!     println!("{} messages, {} satellites", status.message_count, status.satellites.total());
//!
//!     monitor.stop().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod rtcm;
pub mod status;
#[cfg(test)]
pub(crate) mod test_utils;

// Stream transport and supervision
pub mod source;
pub mod sources;
pub mod supervisor;

// Core exports
pub use config::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, DEFAULT_RECONNECT_DELAY,
    DEFAULT_UPDATE_INTERVAL, StreamConfig,
};
pub use error::{MonitorError, Result};
pub use rtcm::satellites::Constellation;
pub use rtcm::{PREAMBLE, RtcmMessage, decode};
pub use status::{MAX_MESSAGE_IDS, SatelliteCounts, StreamStatus};

// Transport and supervisor exports
pub use source::{MessageSource, SourceFactory};
pub use sources::ntrip::{NtripFactory, NtripSession};
pub use supervisor::{ListenerId, StreamMonitor};
