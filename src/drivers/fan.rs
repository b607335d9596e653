//! Purge fan actuator.
//!
//! A dumb on/off actuator behind a MOSFET.  The acquisition pipeline turns
//! it on for the purge stage and off again *before* sampling starts, so the
//! sensor reads still air.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the fan GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct FanDriver {
    on: bool,
}

impl FanDriver {
    pub fn new() -> Self {
        // The pin is driven low during hw_init; mirror that here.
        Self { on: false }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(pins::FAN_GPIO, on);
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
