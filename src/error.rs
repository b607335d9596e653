#![allow(dead_code)] // Unified `Error`/`Result` reserved for a typed control-loop return

//! Unified error types for the CO2 logger firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform.  All variants are `Copy`
//! so they can be cheaply passed around without allocation.
//!
//! Nothing in this taxonomy is fatal: every failure mode degrades to a
//! documented sentinel (invalid sample, missing climate fields, fallback
//! sleep duration) and the cycle always returns control to the power loop.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor response frame failed validation.
    Frame(FrameError),
    /// The climate (humidity/temperature) sensor could not be read.
    Climate(ClimateError),
    /// The real-time clock returned unusable data.
    Clock(ClockError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Climate(e) => write!(f, "climate: {e}"),
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor frame errors
// ---------------------------------------------------------------------------

/// Why a 9-byte sensor response was rejected.  A rejected frame yields an
/// invalid sample — never a zero or truncated concentration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer (or more) than 9 bytes arrived within the frame timeout.
    Truncated { got: usize },
    /// The echoed opcode at offset 1 did not match the request.
    WrongOpcode { got: u8 },
    /// The checksum byte did not match the computed checksum.
    BadChecksum { got: u8, want: u8 },
    /// Decoded concentration is outside the configured plausible bounds.
    OutOfRange { ppm: u16 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { got } => write!(f, "short frame ({got}/9 bytes)"),
            Self::WrongOpcode { got } => write!(f, "opcode echo 0x{got:02X}"),
            Self::BadChecksum { got, want } => {
                write!(f, "checksum 0x{got:02X} (expected 0x{want:02X})")
            }
            Self::OutOfRange { ppm } => write!(f, "{ppm} ppm out of plausible range"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Climate sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateError {
    /// The sensor did not answer the start pulse.
    NoResponse,
    /// Bit timing decode failed mid-transfer.
    Timeout,
    /// The transfer completed but the parity byte was wrong.
    BadParity,
}

impl fmt::Display for ClimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no response to start pulse"),
            Self::Timeout => write!(f, "bit timing timeout"),
            Self::BadParity => write!(f, "parity check failed"),
        }
    }
}

impl From<ClimateError> for Error {
    fn from(e: ClimateError) -> Self {
        Self::Climate(e)
    }
}

// ---------------------------------------------------------------------------
// Clock errors
// ---------------------------------------------------------------------------

/// An unreliable clock is never treated as a guess: the scheduler reports
/// "not due" and the power planner falls back to its default duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The clock-halt flag is set — the oscillator is stopped and every
    /// calendar field is unreliable.
    Halted,
    /// A decoded calendar field is outside its legal range.
    OutOfRange,
    /// The RTC bus could not be driven.
    BusFault,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halted => write!(f, "clock halt flag set"),
            Self::OutOfRange => write!(f, "calendar field out of range"),
            Self::BusFault => write!(f, "RTC bus fault"),
        }
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
