//! Fuzz target: `parse_concentration` (sensor response framing)
//!
//! Drives arbitrary byte sequences through the frame validator and asserts:
//! - No panics under any input
//! - `Ok` is returned only for exactly 9-byte frames with the read opcode
//!   echo and a matching checksum
//! - The decoded value is exactly the big-endian payload bytes
//!
//! cargo fuzz run fuzz_frame_parse

#![no_main]

use co2logger::sensors::co2::{checksum, parse_concentration, FRAME_LEN, OPCODE_READ};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match parse_concentration(data) {
        Ok(ppm) => {
            let frame: &[u8; FRAME_LEN] = data.try_into().unwrap();
            assert_eq!(frame[1], OPCODE_READ, "accepted frame without opcode echo");
            assert_eq!(frame[8], checksum(frame), "accepted frame with bad checksum");
            assert_eq!(ppm, u16::from_be_bytes([frame[2], frame[3]]));
        }
        Err(_) => {
            // Rejection is always fine; it must just never panic.
        }
    }

    // Parsing is a pure function of the bytes — a second pass agrees.
    assert_eq!(
        parse_concentration(data).is_ok(),
        parse_concentration(data).is_ok()
    );
});
