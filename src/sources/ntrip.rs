//! NTRIP v1 transport session
//!
//! One [`NtripSession`] owns one TCP connection for its whole life: connect,
//! HTTP-style handshake, then a read loop that feeds the frame decoder and
//! yields messages in arrival order. The session is single-use; the
//! supervisor builds a fresh one per attempt through [`NtripFactory`].

use std::collections::VecDeque;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::StreamConfig;
use crate::rtcm::{self, RtcmMessage};
use crate::source::{MessageSource, SourceFactory};
use crate::{MonitorError, Result};

/// User-Agent sent in the NTRIP request.
const USER_AGENT: &str = concat!("NTRIP ntrip-monitor/", env!("CARGO_PKG_VERSION"));

/// Size of the initial read that captures the response headers.
const HANDSHAKE_READ_SIZE: usize = 8192;

/// Size of steady-state stream reads.
const STREAM_READ_SIZE: usize = 4096;

/// [`SourceFactory`] that opens NTRIP sessions from a [`StreamConfig`].
pub struct NtripFactory {
    config: StreamConfig,
}

impl NtripFactory {
    /// Create a factory for the given stream configuration.
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl SourceFactory for NtripFactory {
    async fn connect(&self) -> Result<Box<dyn MessageSource>> {
        let session = NtripSession::connect(&self.config).await?;
        Ok(Box::new(session))
    }
}

/// One live NTRIP connection delivering decoded RTCM messages.
///
/// The TCP stream is released when the session is dropped, whichever way
/// the sequence ended.
#[derive(Debug)]
pub struct NtripSession {
    stream: TcpStream,
    buffer: BytesMut,
    pending: VecDeque<RtcmMessage>,
    read_timeout: std::time::Duration,
}

impl NtripSession {
    /// Connect and perform the NTRIP v1 handshake.
    ///
    /// TCP connect and the initial response both run under the config's
    /// handshake timeout; any stream bytes received alongside the response
    /// headers seed the frame accumulator.
    pub async fn connect(config: &StreamConfig) -> Result<Self> {
        let host = config.host.as_str();
        let port = config.port;
        debug!("Connecting to {}:{}/{}", host, port, config.mountpoint);

        let mut stream = timeout(config.handshake_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| MonitorError::connect_failed(host, port, "connect timed out", None))?
            .map_err(|e| MonitorError::connect_failed(host, port, e.to_string(), Some(e)))?;

        let credential = BASE64.encode(format!("{}:{}", config.username, config.password));
        let request = format!(
            "GET /{} HTTP/1.0\r\n\
             User-Agent: {USER_AGENT}\r\n\
             Accept: */*\r\n\
             Authorization: Basic {credential}\r\n\
             \r\n",
            config.mountpoint
        );
        stream.write_all(request.as_bytes()).await?;
        debug!("Sent NTRIP request for mountpoint {}", config.mountpoint);

        // First read carries the response line, headers, and possibly the
        // start of the RTCM stream.
        let mut initial = vec![0u8; HANDSHAKE_READ_SIZE];
        let n = timeout(config.handshake_timeout, stream.read(&mut initial))
            .await
            .map_err(|_| {
                MonitorError::connect_failed(host, port, "timed out waiting for response", None)
            })??;
        if n == 0 {
            return Err(MonitorError::EmptyResponse);
        }
        initial.truncate(n);

        let first_line = response_line(&initial);
        debug!("Caster response: {}", first_line);
        // Accepts both `HTTP/1.x 200 ...` and the legacy `ICY 200 OK` form.
        if !first_line.contains("200") {
            return Err(MonitorError::handshake_rejected(first_line));
        }

        let body_start = end_of_headers(&initial).unwrap_or_else(|| {
            // Non-compliant caster: no header terminator in the first read,
            // treat everything as stream data.
            debug!("No header terminator found, treating initial read as data");
            0
        });
        let mut buffer = BytesMut::with_capacity(STREAM_READ_SIZE);
        buffer.extend_from_slice(&initial[body_start..]);

        info!(
            "Connected to {}:{}/{} ({} stream bytes after headers)",
            host,
            port,
            config.mountpoint,
            buffer.len()
        );

        Ok(Self {
            stream,
            buffer,
            pending: VecDeque::new(),
            read_timeout: config.read_timeout,
        })
    }
}

#[async_trait::async_trait]
impl MessageSource for NtripSession {
    async fn next_message(&mut self) -> Result<RtcmMessage> {
        loop {
            if let Some(msg) = self.pending.pop_front() {
                return Ok(msg);
            }

            self.pending.extend(rtcm::decode(&mut self.buffer));
            if let Some(msg) = self.pending.pop_front() {
                return Ok(msg);
            }

            let mut chunk = [0u8; STREAM_READ_SIZE];
            let n = timeout(self.read_timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| {
                    warn!("No data within {:?}", self.read_timeout);
                    MonitorError::IdleTimeout { timeout: self.read_timeout }
                })??;
            if n == 0 {
                warn!("Server closed the stream");
                return Err(MonitorError::PeerClosed);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Extract the trimmed first line of the response for diagnostics.
fn response_line(data: &[u8]) -> String {
    let line = data.split(|&b| b == b'\n').next().unwrap_or(data);
    String::from_utf8_lossy(line).trim().to_string()
}

/// Find the first byte after the header block, checking `\r\n\r\n` before
/// the bare `\n\n` some casters send.
fn end_of_headers(data: &[u8]) -> Option<usize> {
    find(data, b"\r\n\r\n").map(|pos| pos + 4).or_else(|| find(data, b"\n\n").map(|pos| pos + 2))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
