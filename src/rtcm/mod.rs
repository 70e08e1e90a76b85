//! RTCM3 frame decoding
//!
//! Slices variable-length RTCM3 frames out of an accumulating byte buffer
//! filled by arbitrary-sized transport reads. The decoder extracts the
//! message id, the declared payload length, and a satellite count for the
//! observation-message families; it does not decode message bodies.
//!
//! ## Frame Structure
//!
//! 1. **Preamble** (1 byte) - always `0xD3`
//! 2. **Length** (2 bytes) - 6 reserved bits, then a 10-bit payload length
//! 3. **Payload** (`length` bytes) - first 12 bits are the message id
//! 4. **CRC-24** (3 bytes) - trailer
//!
//! Known limitation: the CRC-24 trailer is not validated, so a corrupted
//! frame with an intact preamble and plausible length is reported as valid.

pub mod satellites;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use satellites::{Constellation, satellite_count};

/// RTCM3 frame preamble byte.
pub const PREAMBLE: u8 = 0xD3;

/// Header (3 bytes) plus CRC trailer (3 bytes).
const FRAME_OVERHEAD: usize = 6;

/// One decoded RTCM3 message.
///
/// This is the fundamental data unit that flows through the system. Only
/// the framing-level fields are decoded; the payload itself is dropped
/// once the satellite count has been extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcmMessage {
    /// 12-bit message id (0-4095).
    pub id: u16,
    /// Declared payload length in bytes (0-1023).
    pub length: u16,
    /// Satellite count, present only for observation messages.
    pub satellites: Option<u8>,
}

impl RtcmMessage {
    /// Constellation this message reports on, derived from the id range.
    pub fn constellation(&self) -> Option<Constellation> {
        Constellation::from_message_id(self.id)
    }

    /// Short human-readable summary, e.g. `RTCM 1077 (12 sats)`.
    pub fn summary(&self) -> String {
        match self.satellites {
            Some(count) => format!("RTCM {} ({} sats)", self.id, count),
            None => format!("RTCM {}", self.id),
        }
    }
}

/// Drain all complete frames from `buf`, returning them in arrival order.
///
/// Leading bytes before the first preamble are discarded; a buffer with no
/// preamble at all is drained entirely. A trailing partial frame is left in
/// `buf`, from its preamble onward, for the next call. Calling again with no
/// new data appended yields nothing and leaves `buf` untouched, so decoding
/// is independent of how the transport chunks its reads.
pub fn decode(buf: &mut BytesMut) -> Vec<RtcmMessage> {
    // Trim garbage ahead of the first preamble.
    match buf.iter().position(|&b| b == PREAMBLE) {
        Some(0) => {}
        Some(pos) => {
            debug!("Trimmed {} non-RTCM bytes from buffer start", pos);
            buf.advance(pos);
        }
        None => {
            if !buf.is_empty() {
                debug!("No RTCM preamble in {} buffered bytes, discarding", buf.len());
                buf.clear();
            }
            return Vec::new();
        }
    }

    let mut messages = Vec::new();
    let mut idx = 0;

    while buf.len() - idx >= FRAME_OVERHEAD {
        if buf[idx] != PREAMBLE {
            idx += 1;
            continue;
        }

        // 10-bit payload length from the two bytes after the preamble.
        let length = u16::from(buf[idx + 1] & 0x03) << 8 | u16::from(buf[idx + 2]);
        let total = length as usize + FRAME_OVERHEAD;
        if buf.len() - idx < total {
            trace!("Incomplete frame: have {} bytes, need {}", buf.len() - idx, total);
            break;
        }

        // 12-bit message id straddles the first two payload bytes.
        let id = u16::from(buf[idx + 3]) << 4 | u16::from(buf[idx + 4] >> 4);
        let satellites = satellite_count(&buf[idx..idx + total], id);

        trace!(id, length, ?satellites, "Decoded RTCM frame");
        messages.push(RtcmMessage { id, length, satellites });
        idx += total;
    }

    buf.advance(idx);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_frame, build_message, build_msm};
    use proptest::prelude::*;

    #[test]
    fn decodes_single_frame() {
        let mut buf = BytesMut::from(&build_message(1005, 19)[..]);
        let messages = decode(&mut buf);
        assert_eq!(messages, vec![RtcmMessage { id: 1005, length: 19, satellites: None }]);
        assert!(buf.is_empty());
    }

    #[test]
    fn decodes_consecutive_frames_in_order() {
        let mut data = build_message(1005, 19);
        data.extend_from_slice(&build_message(1033, 40));
        data.extend_from_slice(&build_message(4072, 12));

        let mut buf = BytesMut::from(&data[..]);
        let ids: Vec<u16> = decode(&mut buf).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1005, 1033, 4072]);
        assert!(buf.is_empty());
    }

    #[test]
    fn trims_leading_garbage() {
        let frame = build_message(1005, 19);
        let mut noisy = vec![0x00, 0x00];
        noisy.extend_from_slice(&frame);

        let mut clean_buf = BytesMut::from(&frame[..]);
        let mut noisy_buf = BytesMut::from(&noisy[..]);
        assert_eq!(decode(&mut noisy_buf), decode(&mut clean_buf));
        assert!(noisy_buf.is_empty());
    }

    #[test]
    fn drains_buffer_with_no_preamble() {
        let mut buf = BytesMut::from(&[0x01u8, 0x02, 0x03, 0x04][..]);
        assert!(decode(&mut buf).is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn retains_incomplete_frame() {
        // Declared 20-byte payload (26-byte frame) with only 18 bytes so far.
        let frame = build_message(1005, 20);
        let mut buf = BytesMut::from(&frame[..18]);
        assert!(decode(&mut buf).is_empty());
        assert_eq!(&buf[..], &frame[..18]);
    }

    #[test]
    fn idempotent_without_new_data() {
        let frame = build_message(1005, 20);
        let mut buf = BytesMut::from(&frame[..18]);
        assert!(decode(&mut buf).is_empty());
        let after_first = buf.clone();
        assert!(decode(&mut buf).is_empty());
        assert_eq!(buf, after_first);
    }

    #[test]
    fn completes_partial_frame_when_rest_arrives() {
        let frame = build_message(1230, 8);
        let mut buf = BytesMut::from(&frame[..5]);
        assert!(decode(&mut buf).is_empty());

        buf.extend_from_slice(&frame[5..]);
        let messages = decode(&mut buf);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, 1230);
        assert!(buf.is_empty());
    }

    #[test]
    fn frame_with_msm_payload_carries_satellite_count() {
        let mut buf = BytesMut::from(&build_msm(1077, 0x0101_0101_0101_0100)[..]);
        let messages = decode(&mut buf);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, 1077);
        assert_eq!(messages[0].satellites, Some(7));
    }

    #[test]
    fn zero_length_payload_frame() {
        let mut buf = BytesMut::from(&build_frame(&[])[..]);
        let messages = decode(&mut buf);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].length, 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn summary_formats_both_shapes() {
        let with = RtcmMessage { id: 1077, length: 30, satellites: Some(9) };
        let without = RtcmMessage { id: 1005, length: 19, satellites: None };
        assert_eq!(with.summary(), "RTCM 1077 (9 sats)");
        assert_eq!(without.summary(), "RTCM 1005");
    }

    proptest! {
        #[test]
        fn chunk_boundaries_do_not_change_output(
            ids in prop::collection::vec(0u16..4096, 1..6),
            lens in prop::collection::vec(4u16..64, 1..6),
            split_fraction in 0.0f64..1.0,
        ) {
            // Property: decoding a stream split at an arbitrary byte boundary
            // yields the same ordered messages as decoding it all at once.
            let mut stream = Vec::new();
            for (id, len) in ids.iter().zip(lens.iter()) {
                stream.extend_from_slice(&build_message(*id, usize::from(*len)));
            }

            let mut whole = BytesMut::from(&stream[..]);
            let expected = decode(&mut whole);

            let split = (stream.len() as f64 * split_fraction) as usize;
            let mut buf = BytesMut::from(&stream[..split]);
            let mut got = decode(&mut buf);
            buf.extend_from_slice(&stream[split..]);
            got.extend(decode(&mut buf));

            prop_assert_eq!(got, expected);
            prop_assert!(buf.is_empty());
        }
    }
}
