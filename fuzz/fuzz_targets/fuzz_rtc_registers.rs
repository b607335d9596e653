//! Fuzz target: `decode_registers` (RTC register block validation)
//!
//! Feeds arbitrary 7-byte register blocks to the decoder and asserts:
//! - No panics under any register contents
//! - Every accepted time has all calendar fields in range
//! - Re-encoding an accepted time decodes back to the same instant
//!
//! cargo fuzz run fuzz_rtc_registers

#![no_main]

use co2logger::drivers::rtc::{decode_registers, encode_registers, RegisterBlock};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 7 {
        return;
    }
    let regs: RegisterBlock = data[..7].try_into().unwrap();

    if let Ok(t) = decode_registers(&regs) {
        assert!(t.fields_in_range(), "decoder accepted out-of-range fields");

        let back = decode_registers(&encode_registers(&t)).unwrap();
        assert_eq!(back, t, "encode/decode round trip drifted");
    }
});
