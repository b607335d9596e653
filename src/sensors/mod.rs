//! Sensor subsystem — the CO2 and climate drivers bundled into the single
//! owned [`SensorChannel`].
//!
//! There is exactly one physical sensor channel in the system.  It is owned
//! here as one object and handed to the arbiter, never reached through
//! ambient globals, so the type system enforces that every access goes
//! through the mutual-exclusion gate.

pub mod climate;
pub mod co2;

use log::warn;

use climate::{ClimateReading, ClimateSensor};
use co2::Co2Sensor;

use crate::clock::CalendarTime;
use crate::error::FrameError;

/// A best-effort snapshot for the live preview path.
#[derive(Debug, Clone, Copy)]
pub struct PreviewReading {
    /// When the snapshot was taken; `None` when the clock was unreadable.
    pub taken_at: Option<CalendarTime>,
    /// `None` when the single exchange failed — the preview shows
    /// "unavailable" rather than a stale or bogus number.
    pub co2_ppm: Option<u16>,
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
}

/// The one physical sensor channel: gas sensor plus climate sensor.
pub struct SensorChannel {
    pub co2: Co2Sensor,
    pub climate: ClimateSensor,
    /// Per-frame response timeout used by preview reads.
    frame_timeout_ms: u32,
}

impl SensorChannel {
    pub fn new(co2: Co2Sensor, climate: ClimateSensor, frame_timeout_ms: u32) -> Self {
        Self {
            co2,
            climate,
            frame_timeout_ms,
        }
    }

    /// One framed exchange for the gas concentration.
    pub fn sample_co2(&mut self, timeout_ms: u32) -> Result<u16, FrameError> {
        self.co2.sample(timeout_ms)
    }

    /// One-shot climate read, degraded to `None` fields on failure.
    pub fn read_climate(&mut self) -> Option<ClimateReading> {
        match self.climate.read() {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("climate read failed: {}", e);
                None
            }
        }
    }

    /// Single quick exchange for the preview path: one gas frame plus one
    /// climate read, stamped with the caller's clock reading.  Failures
    /// degrade field-by-field.
    pub fn quick_read(&mut self, taken_at: Option<CalendarTime>) -> PreviewReading {
        let co2_ppm = match self.co2.sample(self.frame_timeout_ms) {
            Ok(ppm) => Some(ppm),
            Err(e) => {
                warn!("preview co2 read failed: {}", e);
                None
            }
        };
        let climate = self.read_climate();
        PreviewReading {
            taken_at,
            co2_ppm,
            temperature_c: climate.map(|c| c.temperature_c),
            humidity_pct: climate.map(|c| c.humidity_pct),
        }
    }
}
