//! Source traits for message sequences

use crate::Result;
use crate::rtcm::RtcmMessage;

/// One live connection's ordered message sequence.
///
/// `next_message` is pull-based and lazy: each call either yields the next
/// decoded message or fails with the error that ended the session (idle
/// timeout, peer close, transport I/O). A correction stream has no normal
/// end, so there is no `None` case; after an error the source is spent and
/// must be discarded. Dropping a source releases its connection.
#[async_trait::async_trait]
pub trait MessageSource: Send {
    /// Get the next decoded message, or the failure ending the sequence.
    async fn next_message(&mut self) -> Result<RtcmMessage>;
}

/// Factory producing one [`MessageSource`] per connection attempt.
///
/// The supervisor calls `connect` on every (re)connect, so a session is
/// never reused across attempts. Setup failures (connect refused, handshake
/// rejected, empty response) surface here, before any message is yielded.
/// Substituting the factory is the seam for testing the supervisor without
/// a network.
#[async_trait::async_trait]
pub trait SourceFactory: Send + Sync + 'static {
    /// Establish a new connection and return its message sequence.
    async fn connect(&self) -> Result<Box<dyn MessageSource>>;
}
