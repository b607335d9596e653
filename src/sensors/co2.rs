//! MH-Z19B CO2 sensor driver — UART framing, validation and exchange.
//!
//! The sensor speaks fixed 9-byte frames at 9600 8N1.  One exchange is:
//! send the read-concentration command, then wait up to the frame timeout
//! for exactly 9 response bytes.  A response is accepted only if the length,
//! opcode echo, checksum *and* plausibility bounds all pass — anything else
//! is an invalid sample, never a zero.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: exchanges frames over UART1 (initialised by hw_init).
//! On host/test: responses are popped from a per-instance script queue
//! loaded via [`Co2Sensor::sim_push_response`].

use log::warn;

use crate::error::FrameError;

/// Frame size in both directions.
pub const FRAME_LEN: usize = 9;

/// Read-concentration opcode, echoed by the sensor at offset 1.
pub const OPCODE_READ: u8 = 0x86;

/// The fixed request frame: start byte, sensor address, opcode, five
/// reserved zero bytes, checksum.
pub const READ_CMD: [u8; FRAME_LEN] = [0xFF, 0x01, 0x86, 0x00, 0x00, 0x00, 0x00, 0x00, 0x79];

/// Frame checksum over bytes 1..=7: `(0xFF - sum + 1) mod 256`.
pub fn checksum(frame: &[u8; FRAME_LEN]) -> u8 {
    let sum = frame[1..8]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    (0xFFu8.wrapping_sub(sum)).wrapping_add(1)
}

/// Validate a response and decode the concentration.
///
/// Checks, in order: length, opcode echo, checksum.  Plausibility bounds
/// are the caller's policy (they come from configuration) and are applied
/// by [`Co2Sensor::sample`].
pub fn parse_concentration(frame: &[u8]) -> Result<u16, FrameError> {
    let frame: &[u8; FRAME_LEN] = frame
        .try_into()
        .map_err(|_| FrameError::Truncated { got: frame.len() })?;

    if frame[1] != OPCODE_READ {
        return Err(FrameError::WrongOpcode { got: frame[1] });
    }

    let want = checksum(frame);
    if frame[8] != want {
        return Err(FrameError::BadChecksum {
            got: frame[8],
            want,
        });
    }

    Ok(u16::from_be_bytes([frame[2], frame[3]]))
}

// ═══════════════════════════════════════════════════════════════
//  Driver
// ═══════════════════════════════════════════════════════════════

/// The UART-attached sensor.  Owns the link; shared access goes through the
/// arbiter, never through this type directly.
pub struct Co2Sensor {
    /// Plausible concentration bounds (ppm, inclusive).
    ppm_min: u16,
    ppm_max: u16,
    #[cfg(not(target_os = "espidf"))]
    script: std::collections::VecDeque<Vec<u8>>,
}

impl Co2Sensor {
    pub fn new(ppm_min: u16, ppm_max: u16) -> Self {
        Self {
            ppm_min,
            ppm_max,
            #[cfg(not(target_os = "espidf"))]
            script: std::collections::VecDeque::new(),
        }
    }

    /// Queue a scripted response for the next exchange (host only).  An
    /// empty frame scripts a timeout.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_push_response(&mut self, frame: &[u8]) {
        self.script.push_back(frame.to_vec());
    }

    /// One full exchange: command out, response in, validated and
    /// range-checked.
    pub fn sample(&mut self, timeout_ms: u32) -> Result<u16, FrameError> {
        let mut buf = [0u8; FRAME_LEN];
        let got = self.exchange(&READ_CMD, &mut buf, timeout_ms);
        let ppm = parse_concentration(&buf[..got])?;
        if ppm < self.ppm_min || ppm > self.ppm_max {
            return Err(FrameError::OutOfRange { ppm });
        }
        Ok(ppm)
    }

    #[cfg(target_os = "espidf")]
    fn exchange(&mut self, cmd: &[u8; FRAME_LEN], buf: &mut [u8; FRAME_LEN], timeout_ms: u32) -> usize {
        use crate::drivers::hw_init;
        hw_init::uart_flush_input();
        if !hw_init::uart_write(cmd) {
            warn!("co2: UART write failed");
            return 0;
        }
        hw_init::uart_read(buf, timeout_ms)
    }

    #[cfg(not(target_os = "espidf"))]
    fn exchange(&mut self, _cmd: &[u8; FRAME_LEN], buf: &mut [u8; FRAME_LEN], _timeout_ms: u32) -> usize {
        match self.script.pop_front() {
            Some(frame) => {
                let n = frame.len().min(FRAME_LEN);
                buf[..n].copy_from_slice(&frame[..n]);
                n
            }
            None => {
                warn!("co2(sim): script exhausted, simulating timeout");
                0
            }
        }
    }
}

/// Build a well-formed response frame for tests and bench scripts.
#[cfg(not(target_os = "espidf"))]
pub fn make_response(ppm: u16) -> [u8; FRAME_LEN] {
    let [hi, lo] = ppm.to_be_bytes();
    let mut frame = [0xFF, OPCODE_READ, hi, lo, 0x00, 0x00, 0x00, 0x00, 0x00];
    frame[8] = checksum(&frame);
    frame
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
