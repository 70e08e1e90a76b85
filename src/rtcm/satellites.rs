//! Satellite-count extraction from observation messages
//!
//! Two bit-field readers cover the two observation families that carry a
//! usable satellite count: the legacy RTK messages (1001-1004, 1009-1012)
//! with an explicit 5-bit count, and the MSM4-7 messages with a 64-bit
//! satellite mask. Both readers are total: short or malformed frames yield
//! `None` rather than aborting the decode pass.

use std::ops::RangeInclusive;

/// GNSS constellations with observation-message id ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constellation {
    Gps,
    Glonass,
    Galileo,
    Qzss,
    Beidou,
}

const LEGACY_GPS: RangeInclusive<u16> = 1001..=1004;
const LEGACY_GLONASS: RangeInclusive<u16> = 1009..=1012;

const MSM_GPS: RangeInclusive<u16> = 1074..=1077;
const MSM_GLONASS: RangeInclusive<u16> = 1084..=1087;
const MSM_GALILEO: RangeInclusive<u16> = 1094..=1097;
const MSM_QZSS: RangeInclusive<u16> = 1114..=1117;
const MSM_BEIDOU: RangeInclusive<u16> = 1124..=1127;

/// Bits ahead of the 5-bit count in a legacy GPS payload:
/// 12 (message id) + 12 (station id) + 30 (epoch) + 1 (sync flag).
const LEGACY_GPS_COUNT_OFFSET: u32 = 55;

/// GLONASS epoch time is 27 bits instead of 30.
const LEGACY_GLONASS_COUNT_OFFSET: u32 = 52;

/// Frame byte range holding the MSM 64-bit satellite mask.
///
/// Approximate: the MSM header fields ahead of the mask (station id, epoch,
/// flags, IOD, clock fields) are treated as constant-width across MSM4-7,
/// which real captures should confirm before counts are trusted.
const MSM_MASK_BYTES: std::ops::Range<usize> = 11..19;

impl Constellation {
    /// Map a message id to its constellation, for observation ranges only.
    pub fn from_message_id(id: u16) -> Option<Self> {
        if LEGACY_GPS.contains(&id) || MSM_GPS.contains(&id) {
            Some(Constellation::Gps)
        } else if LEGACY_GLONASS.contains(&id) || MSM_GLONASS.contains(&id) {
            Some(Constellation::Glonass)
        } else if MSM_GALILEO.contains(&id) {
            Some(Constellation::Galileo)
        } else if MSM_QZSS.contains(&id) {
            Some(Constellation::Qzss)
        } else if MSM_BEIDOU.contains(&id) {
            Some(Constellation::Beidou)
        } else {
            None
        }
    }
}

/// True for the legacy RTK observation families.
pub fn is_legacy_observation(id: u16) -> bool {
    LEGACY_GPS.contains(&id) || LEGACY_GLONASS.contains(&id)
}

/// True for the MSM4-7 windows of every tracked constellation.
pub fn is_msm(id: u16) -> bool {
    MSM_GPS.contains(&id)
        || MSM_GLONASS.contains(&id)
        || MSM_GALILEO.contains(&id)
        || MSM_QZSS.contains(&id)
        || MSM_BEIDOU.contains(&id)
}

/// Extract the satellite count from a complete frame, if `id` is an
/// observation message and the frame is long enough to hold the field.
pub fn satellite_count(frame: &[u8], id: u16) -> Option<u8> {
    if is_legacy_observation(id) {
        legacy_satellite_count(frame, id)
    } else if is_msm(id) {
        msm_satellite_count(frame)
    } else {
        None
    }
}

/// Read the 5-bit satellite count of a legacy observation message.
///
/// The count sits 55 bits into the payload for the GPS family and 52 bits
/// for GLONASS (27-bit epoch instead of 30). Both offsets land inside the
/// payload's leading 8 bytes, which are read as one big-endian word. A
/// count of zero is reported as `None` so downstream accumulators only see
/// real observations.
fn legacy_satellite_count(frame: &[u8], id: u16) -> Option<u8> {
    let word: [u8; 8] = frame.get(3..11)?.try_into().ok()?;
    let word = u64::from_be_bytes(word);

    let offset = if LEGACY_GLONASS.contains(&id) {
        LEGACY_GLONASS_COUNT_OFFSET
    } else {
        LEGACY_GPS_COUNT_OFFSET
    };
    let count = ((word >> (64 - offset - 5)) & 0x1F) as u8;

    (count > 0).then_some(count)
}

/// Count set bits in the 64-bit MSM satellite mask.
///
/// Reads the mask at a fixed frame offset (see [`MSM_MASK_BYTES`]); an
/// all-zero mask or a frame too short to contain it yields `None`.
fn msm_satellite_count(frame: &[u8]) -> Option<u8> {
    let mask: [u8; 8] = frame.get(MSM_MASK_BYTES)?.try_into().ok()?;
    let count = u64::from_be_bytes(mask).count_ones() as u8;

    (count > 0).then_some(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_legacy_observation, build_message, build_msm};

    #[test]
    fn legacy_gps_count_at_offset_55() {
        let frame = build_legacy_observation(1003, 9);
        assert_eq!(satellite_count(&frame, 1003), Some(9));
    }

    #[test]
    fn legacy_glonass_count_at_offset_52() {
        let frame = build_legacy_observation(1011, 14);
        assert_eq!(satellite_count(&frame, 1011), Some(14));
    }

    #[test]
    fn legacy_zero_count_is_absent() {
        let frame = build_legacy_observation(1004, 0);
        assert_eq!(satellite_count(&frame, 1004), None);
    }

    #[test]
    fn legacy_max_count_fits_five_bits() {
        let frame = build_legacy_observation(1001, 31);
        assert_eq!(satellite_count(&frame, 1001), Some(31));
    }

    #[test]
    fn legacy_short_frame_is_absent() {
        // 4-byte payload: frame ends before the count field's word.
        let frame = build_message(1003, 4);
        assert_eq!(satellite_count(&frame, 1003), None);
    }

    #[test]
    fn msm_count_is_mask_popcount() {
        let frame = build_msm(1077, 0x0101_0101_0101_0100);
        assert_eq!(satellite_count(&frame, 1077), Some(7));
    }

    #[test]
    fn msm_zero_mask_is_absent() {
        let frame = build_msm(1087, 0);
        assert_eq!(satellite_count(&frame, 1087), None);
    }

    #[test]
    fn msm_short_frame_is_absent() {
        // 8-byte payload: frame ends before the mask bytes.
        let frame = build_message(1097, 8);
        assert_eq!(satellite_count(&frame, 1097), None);
    }

    #[test]
    fn non_observation_ids_have_no_count() {
        let frame = build_msm(1005, u64::MAX);
        assert_eq!(satellite_count(&frame, 1005), None);
        assert_eq!(satellite_count(&frame, 1013), None);
        assert_eq!(satellite_count(&frame, 1078), None);
    }

    #[test]
    fn constellation_mapping_covers_all_ranges() {
        assert_eq!(Constellation::from_message_id(1001), Some(Constellation::Gps));
        assert_eq!(Constellation::from_message_id(1074), Some(Constellation::Gps));
        assert_eq!(Constellation::from_message_id(1012), Some(Constellation::Glonass));
        assert_eq!(Constellation::from_message_id(1087), Some(Constellation::Glonass));
        assert_eq!(Constellation::from_message_id(1094), Some(Constellation::Galileo));
        assert_eq!(Constellation::from_message_id(1117), Some(Constellation::Qzss));
        assert_eq!(Constellation::from_message_id(1127), Some(Constellation::Beidou));
        assert_eq!(Constellation::from_message_id(1005), None);
        assert_eq!(Constellation::from_message_id(1073), None);
    }
}
