//! DHT22 / AM2301 humidity and temperature sensor driver.
//!
//! Single-wire protocol: the host pulls the line low for ~1 ms, the sensor
//! answers with an 80 µs low/high preamble and then 40 data bits, each
//! encoded in the length of a high pulse (~27 µs = 0, ~70 µs = 1).  The
//! fifth byte is a wrapping sum of the first four.
//!
//! One-shot per acquisition cycle: on failure the climate fields of the
//! record become sentinels and the cycle continues.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the data GPIO with microsecond timing.
//! On host/test: returns a per-instance injected reading.

use crate::error::ClimateError;

/// One decoded climate reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode the 5-byte DHT22 payload.  Pure, shared by both targets.
pub fn decode_payload(bytes: &[u8; 5]) -> Result<ClimateReading, ClimateError> {
    let sum = bytes[0]
        .wrapping_add(bytes[1])
        .wrapping_add(bytes[2])
        .wrapping_add(bytes[3]);
    if sum != bytes[4] {
        return Err(ClimateError::BadParity);
    }

    let humidity_pct = f32::from(u16::from_be_bytes([bytes[0], bytes[1]])) / 10.0;
    // Temperature: bit 15 is the sign, magnitude in tenths.
    let raw_t = u16::from_be_bytes([bytes[2], bytes[3]]);
    let magnitude = f32::from(raw_t & 0x7FFF) / 10.0;
    let temperature_c = if raw_t & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(ClimateReading {
        temperature_c,
        humidity_pct,
    })
}

/// The climate sensor on its data GPIO.
pub struct ClimateSensor {
    data_gpio: i32,
    #[cfg(not(target_os = "espidf"))]
    sim_next: Option<Result<ClimateReading, ClimateError>>,
}

impl ClimateSensor {
    pub fn new(data_gpio: i32) -> Self {
        Self {
            data_gpio,
            #[cfg(not(target_os = "espidf"))]
            sim_next: None,
        }
    }

    /// Inject the outcome of the next read (host only).  Unset = NoResponse.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reading(&mut self, next: Result<ClimateReading, ClimateError>) {
        self.sim_next = Some(next);
    }

    /// One-shot read.
    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> Result<ClimateReading, ClimateError> {
        let mut payload = [0u8; 5];
        self.transfer(&mut payload)?;
        decode_payload(&payload)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> Result<ClimateReading, ClimateError> {
        let _ = self.data_gpio;
        self.sim_next.take().unwrap_or(Err(ClimateError::NoResponse))
    }

    /// Drive the single-wire transfer and collect the 40 data bits.
    #[cfg(target_os = "espidf")]
    fn transfer(&mut self, payload: &mut [u8; 5]) -> Result<(), ClimateError> {
        use crate::drivers::hw_init;

        // Start pulse: hold low ≥ 1 ms, then release and listen.
        hw_init::gpio_set_output(self.data_gpio);
        hw_init::gpio_write(self.data_gpio, false);
        hw_init::delay_us(1100);
        hw_init::gpio_set_input(self.data_gpio);

        // Preamble: sensor pulls low ~80 µs then high ~80 µs.
        hw_init::wait_level(self.data_gpio, false, 100).ok_or(ClimateError::NoResponse)?;
        hw_init::wait_level(self.data_gpio, true, 100).ok_or(ClimateError::NoResponse)?;
        hw_init::wait_level(self.data_gpio, false, 100).ok_or(ClimateError::NoResponse)?;

        for bit in 0..40 {
            // Each bit: ~50 µs low, then a high whose length encodes the bit.
            hw_init::wait_level(self.data_gpio, true, 80).ok_or(ClimateError::Timeout)?;
            let high_us = hw_init::wait_level(self.data_gpio, false, 100)
                .ok_or(ClimateError::Timeout)?;
            if high_us > 40 {
                payload[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Ok(())
    }
}
