//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Thin wrappers exposing the fan driver, DS1302 driver, task watchdog,
//! and the FreeRTOS delay through [`FanPort`], [`ClockPort`],
//! [`WatchdogPort`] and [`DelayPort`].  On non-espidf targets the
//! underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{ClockPort, DelayPort, FanPort, WatchdogPort};
use crate::clock::CalendarTime;
use crate::drivers::fan::FanDriver;
use crate::drivers::rtc::{Ds1302, Ds1302Bus};
use crate::drivers::watchdog::Watchdog;
use crate::error::ClockError;

// ── FanPort implementation ────────────────────────────────────

pub struct FanAdapter {
    driver: FanDriver,
}

impl FanAdapter {
    pub fn new(driver: FanDriver) -> Self {
        Self { driver }
    }
}

impl FanPort for FanAdapter {
    fn set(&mut self, on: bool) {
        self.driver.set(on);
    }
}

// ── ClockPort implementation ──────────────────────────────────

pub struct RtcClock<B: Ds1302Bus> {
    rtc: Ds1302<B>,
}

impl<B: Ds1302Bus> RtcClock<B> {
    pub fn new(rtc: Ds1302<B>) -> Self {
        Self { rtc }
    }

    pub fn inner_mut(&mut self) -> &mut Ds1302<B> {
        &mut self.rtc
    }
}

impl<B: Ds1302Bus> ClockPort for RtcClock<B> {
    fn now(&mut self) -> Result<CalendarTime, ClockError> {
        self.rtc.read_time()
    }
}

// ── DelayPort implementation ──────────────────────────────────

/// Blocking delay.  `std::thread::sleep` maps to `vTaskDelay` under
/// ESP-IDF, so the scheduler keeps running other tasks during waits.
pub struct BlockingDelay;

impl DelayPort for BlockingDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

// ── WatchdogPort implementation ───────────────────────────────

pub struct WatchdogAdapter {
    wdt: Watchdog,
}

impl WatchdogAdapter {
    pub fn new(wdt: Watchdog) -> Self {
        Self { wdt }
    }
}

impl WatchdogPort for WatchdogAdapter {
    fn feed(&mut self) {
        self.wdt.feed();
    }
}
