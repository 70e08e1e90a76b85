//! Shared helpers for constructing synthetic RTCM3 frames in tests.

/// Wrap `payload` in a complete frame: preamble, 10-bit length, payload,
/// and a placeholder CRC-24 trailer (the decoder does not validate it).
pub fn build_frame(payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() < 1024, "payload exceeds 10-bit length field");
    let len = payload.len() as u16;

    let mut frame = Vec::with_capacity(payload.len() + 6);
    frame.push(0xD3);
    frame.push((len >> 8) as u8 & 0x03);
    frame.push((len & 0xFF) as u8);
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&[0x00, 0x00, 0x00]);
    frame
}

/// Build a frame whose payload starts with the 12-bit `id` and is otherwise
/// zero-filled to `payload_len` bytes.
pub fn build_message(id: u16, payload_len: usize) -> Vec<u8> {
    assert!(payload_len >= 2, "payload too short to hold a message id");
    assert!(id < 4096, "message id exceeds 12 bits");

    let mut payload = vec![0u8; payload_len];
    payload[0] = (id >> 4) as u8;
    payload[1] = ((id & 0x0F) << 4) as u8;
    build_frame(&payload)
}

/// Build a legacy observation frame with `count` in the 5-bit satellite
/// field: offset 55 bits into the payload for the GPS family (1001-1004),
/// 52 bits for GLONASS (1009-1012, 27-bit epoch).
pub fn build_legacy_observation(id: u16, count: u8) -> Vec<u8> {
    assert!(count < 32, "satellite count exceeds 5 bits");
    let glonass = (1009..=1012).contains(&id);

    let station: u64 = 123;
    let sync: u64 = 1;
    let word = if glonass {
        let epoch: u64 = 0x51F_4240; // within 27 bits
        u64::from(id) << 52 | station << 40 | epoch << 13 | sync << 12 | u64::from(count) << 7
    } else {
        let epoch: u64 = 0x1CF7_C580; // within 30 bits
        u64::from(id) << 52 | station << 40 | epoch << 10 | sync << 9 | u64::from(count) << 4
    };

    let mut payload = word.to_be_bytes().to_vec();
    payload.extend_from_slice(&[0x00, 0x00]);
    build_frame(&payload)
}

/// Build an MSM frame carrying `mask` as the 64-bit satellite mask at frame
/// bytes 11..19 (payload bytes 8..16).
pub fn build_msm(id: u16, mask: u64) -> Vec<u8> {
    let mut payload = vec![0u8; 20];
    payload[0] = (id >> 4) as u8;
    payload[1] = ((id & 0x0F) << 4) as u8;
    payload[8..16].copy_from_slice(&mask.to_be_bytes());
    build_frame(&payload)
}
