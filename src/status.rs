//! Aggregate status of one monitored stream

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::rtcm::RtcmMessage;
use crate::rtcm::satellites::Constellation;

/// Cap on the distinct-message-id history; oldest ids are evicted first.
pub const MAX_MESSAGE_IDS: usize = 20;

/// Latest satellite count per tracked constellation.
///
/// Legacy and MSM observation messages for the same constellation feed the
/// same field; a newer count overwrites the previous one, it is never summed
/// across message types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SatelliteCounts {
    pub gps: u8,
    pub glonass: u8,
    pub galileo: u8,
    pub beidou: u8,
}

impl SatelliteCounts {
    /// Sum over all tracked constellations.
    pub fn total(&self) -> u16 {
        u16::from(self.gps)
            + u16::from(self.glonass)
            + u16::from(self.galileo)
            + u16::from(self.beidou)
    }
}

/// Snapshot of a monitored stream's state.
///
/// Mutated only by the supervisor's run loop; everyone else receives clones.
#[derive(Debug, Clone, Default)]
pub struct StreamStatus {
    /// True once a message has arrived on the current connection.
    pub connected: bool,
    /// When the current (or most recent) connection started delivering data.
    pub connected_at: Option<DateTime<Utc>>,
    /// When the last message arrived.
    pub last_update: Option<DateTime<Utc>>,
    /// Text of the most recent failure, cleared at the start of each attempt.
    pub last_error: Option<String>,
    /// Summary of the most recent message, e.g. `RTCM 1077 (12 sats)`.
    pub last_message: Option<String>,
    /// Id of the most recent message.
    pub last_message_id: Option<u16>,
    /// Cumulative message count across reconnects.
    pub message_count: u64,
    /// Distinct message ids seen, in first-seen order, capped at
    /// [`MAX_MESSAGE_IDS`].
    pub message_ids: VecDeque<u16>,
    /// Latest per-constellation satellite counts.
    pub satellites: SatelliteCounts,
}

impl StreamStatus {
    /// Apply one decoded message.
    pub(crate) fn record_message(&mut self, msg: &RtcmMessage) {
        let now = Utc::now();
        if !self.connected {
            self.connected = true;
            self.connected_at = Some(now);
        }
        self.last_update = Some(now);
        self.last_message_id = Some(msg.id);
        self.message_count += 1;

        if !self.message_ids.contains(&msg.id) {
            self.message_ids.push_back(msg.id);
            if self.message_ids.len() > MAX_MESSAGE_IDS {
                self.message_ids.pop_front();
            }
        }

        if let Some(count) = msg.satellites {
            match msg.constellation() {
                Some(Constellation::Gps) => self.satellites.gps = count,
                Some(Constellation::Glonass) => self.satellites.glonass = count,
                Some(Constellation::Galileo) => self.satellites.galileo = count,
                Some(Constellation::Beidou) => self.satellites.beidou = count,
                // QZSS counts appear on the message but have no accumulator.
                Some(Constellation::Qzss) | None => {}
            }
        }

        self.last_message = Some(msg.summary());
    }

    /// Record a session failure.
    pub(crate) fn record_error(&mut self, text: impl Into<String>) {
        self.connected = false;
        self.last_error = Some(text.into());
    }

    /// Clear the error field at the start of a connection attempt.
    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }
}
