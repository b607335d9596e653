//! CO₂ Logger Firmware — Main Entry Point
//!
//! Hexagonal architecture around one slot-driven controller loop:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  FanAdapter     RtcClock      NvsAdapter     CsvRecordSink   │
//! │  (FanPort)      (ClockPort)   (Config+NVS)   (RecordSink)    │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │        AcquisitionService (pure logic)             │      │
//! │  │  schedule · pipeline · aggregate · sleep plan      │      │
//! │  └────────────────────────────────────────────────────┘      │
//! │                                                              │
//! │  SensorArbiter (exclusive vs preview) · PowerManager         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use co2logger::adapters::hardware::{BlockingDelay, FanAdapter, RtcClock, WatchdogAdapter};
use co2logger::adapters::nvs::NvsAdapter;
use co2logger::adapters::sdcard::CsvRecordSink;
use co2logger::app::ports::{ClockPort, ConfigPort, WatchdogPort};
use co2logger::app::service::AcquisitionService;
use co2logger::arbiter::SensorArbiter;
use co2logger::clock::CalendarTime;
use co2logger::config::LoggerConfig;
use co2logger::drivers::fan::FanDriver;
use co2logger::drivers::rtc::{BitBangBus, Ds1302, Ds1302Bus};
use co2logger::drivers::watchdog::Watchdog;
use co2logger::drivers::hw_init;
use co2logger::pins;
use co2logger::power::{PowerManager, WakeCause};
use co2logger::sensors::climate::ClimateSensor;
use co2logger::sensors::co2::Co2Sensor;
use co2logger::sensors::SensorChannel;

/// VFS mount point of the record medium.  The card is mounted by the
/// board-support layer before this binary's logic runs.
const SDCARD_ROOT: &str = "/sdcard";

/// How often the operator window refreshes its preview.
const PREVIEW_PERIOD_SECS: u32 = 5;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CO2 Logger v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripheral bring-up ────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // In production this triggers the watchdog reset after timeout.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            LoggerConfig::default()
        }
    };
    // Subscribed only after the config is known: the timeout scales with
    // the sampling budget.
    let watchdog = Watchdog::new(config.sampling.watchdog_timeout_ms());

    // ── 4. Power manager + wake cause ─────────────────────────
    let power_mgr = PowerManager::new(pins::BUTTON_GPIO);
    let wake_cause = power_mgr.determine_wake_cause();
    info!("Boot: {:?}", wake_cause);

    // ── 5. Real-time clock ────────────────────────────────────
    let bus = BitBangBus::new(pins::RTC_CLK_GPIO, pins::RTC_IO_GPIO, pins::RTC_RST_GPIO);
    let mut clock = RtcClock::new(Ds1302::new(bus));

    if wake_cause == WakeCause::PowerOn {
        seed_clock_on_first_boot(&mut nvs, clock.inner_mut());
    }
    match clock.inner_mut().read_time() {
        Ok(t) => info!("RTC: {} {}", t.date_string(), t.time_string()),
        Err(e) => warn!("RTC unreadable at boot: {}", e),
    }

    // ── 6. Sensor channel + arbiter ───────────────────────────
    let channel = SensorChannel::new(
        Co2Sensor::new(config.sampling.ppm_min, config.sampling.ppm_max),
        ClimateSensor::new(pins::DHT_DATA_GPIO),
        config.sampling.frame_timeout_ms,
    );
    let arbiter = SensorArbiter::new(channel);

    // ── 7. Record sink ────────────────────────────────────────
    let mut sink = CsvRecordSink::new(SDCARD_ROOT);

    // ── 8. Operator window on button wake ─────────────────────
    let mut wdt = WatchdogAdapter::new(watchdog);
    if wake_cause == WakeCause::Button {
        run_operator_window(&arbiter, &mut clock, &config, &power_mgr, &mut wdt);
    }

    // ── 9. Controller loop ────────────────────────────────────
    let mut fan = FanAdapter::new(FanDriver::new());
    let mut delay = BlockingDelay;
    let mut service = AcquisitionService::new(config);

    info!("System ready. Entering controller loop.");
    loop {
        wdt.feed();
        let plan = service.step(
            &mut clock,
            &arbiter,
            &mut fan,
            &mut delay,
            &mut wdt,
            &mut sink,
        );
        power_mgr.execute(plan);
    }
}

/// Seed a factory-fresh DS1302 from the build timestamp, exactly once.
///
/// The marker latches in NVS so a firmware re-flash never rolls back a
/// clock the operator has since corrected.  A halted chip with the marker
/// set means the backup cell died; that is logged, not silently re-seeded.
fn seed_clock_on_first_boot(nvs: &mut NvsAdapter, rtc: &mut Ds1302<impl Ds1302Bus>) {
    if nvs.clock_seeded() {
        if rtc.is_halted() {
            warn!("RTC halted but already seeded — backup cell likely dead");
        }
        return;
    }

    let build_epoch: u64 = match env!("BUILD_EPOCH_SECS").parse() {
        Ok(v) => v,
        Err(_) => {
            warn!("BUILD_EPOCH_SECS unparsable, skipping clock seed");
            return;
        }
    };
    let t = CalendarTime::from_unix(build_epoch);
    rtc.set_time(&t);
    info!("RTC seeded from build time: {} {}", t.date_string(), t.time_string());

    if let Err(e) = nvs.mark_clock_seeded() {
        warn!("failed to persist clock seed marker: {}", e);
    }
}

/// Keep the device awake for the configured operator window, refreshing a
/// best-effort preview.  The preview never blocks: if the scheduled job
/// holds the sensor lock, the refresh is skipped for this period.
fn run_operator_window(
    arbiter: &SensorArbiter,
    clock: &mut impl ClockPort,
    config: &LoggerConfig,
    power_mgr: &PowerManager,
    wdt: &mut WatchdogAdapter,
) {
    let window_secs = config.power.operator_window_secs;
    info!("operator window: staying awake {}s", window_secs);

    let mut remaining = window_secs;
    while remaining > 0 {
        wdt.feed();
        match arbiter.try_quick_read(clock.now().ok()) {
            Some(p) => info!(
                "preview at {}: co2={:?} ppm, temp={:?} C, hum={:?} %",
                p.taken_at
                    .map(|t| t.time_string())
                    .as_ref()
                    .map_or("--:--:--", |s| s.as_str()),
                p.co2_ppm, p.temperature_c, p.humidity_pct
            ),
            None => info!("preview: sensor busy, skipped"),
        }
        let slice = remaining.min(PREVIEW_PERIOD_SECS);
        power_mgr.timed_wait(slice);
        remaining -= slice;
    }
    info!("operator window closed, resuming schedule");
}
