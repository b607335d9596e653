//! Acquisition service — the hexagonal core.
//!
//! [`AcquisitionService`] owns the schedule policy, debounce state, and the
//! purge → settle → sample pipeline.  It exposes a clean, hardware-agnostic
//! API.  All I/O flows through port traits injected at call sites, making
//! the entire service testable with mock adapters.
//!
//! ```text
//!   ClockPort ──▶ ┌─────────────────────────┐ ──▶ RecordSink
//!                 │   AcquisitionService     │
//!     FanPort ◀── │  schedule · pipeline ·   │
//!   SensorArbiter │  aggregate · sleep plan  │
//!                 └─────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::aggregate::{self, AggregatedReading, RawSample, MAX_SAMPLES};
use crate::arbiter::SensorArbiter;
use crate::clock::CalendarTime;
use crate::config::LoggerConfig;
use crate::power::{plan_sleep, SleepPlan};
use crate::record::MeasurementRecord;
use crate::scheduler::{ScheduleState, SlotScheduler};

use super::ports::{ClockPort, DelayPort, FanPort, RecordSink, WatchdogPort};

// ───────────────────────────────────────────────────────────────
// AcquisitionService
// ───────────────────────────────────────────────────────────────

/// Orchestrates one controller iteration: check the clock, run a cycle when
/// a slot is due, persist the record, and plan the next sleep.
pub struct AcquisitionService {
    config: LoggerConfig,
    scheduler: SlotScheduler,
    state: ScheduleState,
    cycle_count: u64,
}

impl AcquisitionService {
    pub fn new(config: LoggerConfig) -> Self {
        let scheduler = SlotScheduler::new(config.scheduler.clone());
        Self {
            config,
            scheduler,
            state: ScheduleState::new(),
            cycle_count: 0,
        }
    }

    /// Completed acquisition cycles since boot.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one controller iteration and return the sleep plan for the gap
    /// until the next boundary.
    ///
    /// An unreadable clock skips the cycle and plans the fallback duration
    /// awake.  A failed record append is logged and dropped — one bad card
    /// write never costs more than one row.
    pub fn step(
        &mut self,
        clock: &mut impl ClockPort,
        arbiter: &SensorArbiter,
        fan: &mut impl FanPort,
        delay: &mut impl DelayPort,
        wdt: &mut impl WatchdogPort,
        sink: &mut impl RecordSink,
    ) -> SleepPlan {
        let now = match clock.now() {
            Ok(t) => t,
            Err(e) => {
                warn!("clock unreadable, skipping slot check: {}", e);
                return plan_sleep(None, &self.config.power, self.config.scheduler.cadence);
            }
        };

        if self.scheduler.is_slot_due(&now, &mut self.state) {
            let reading = self.run_cycle(arbiter, fan, delay, wdt, now);
            let record = self.build_record(reading);
            if let Err(e) = sink.append(&record) {
                warn!("record append failed, row dropped: {}", e);
            }
            if let Some(slot) = self.scheduler.slot_at(&now) {
                self.state.mark_fired(slot);
            }
        }

        // Re-read the clock: a full cycle takes over a minute, and planning
        // sleep from the pre-cycle time would target a boundary already past.
        let after = clock.now().ok();
        plan_sleep(
            after.as_ref(),
            &self.config.power,
            self.config.scheduler.cadence,
        )
    }

    // ── Acquisition pipeline ──────────────────────────────────

    /// One full cycle: purge → settle → exclusive sampling → median.
    ///
    /// The sensor lock is held only for the sampling phase; the purge and
    /// settle phases leave the preview path free.
    pub fn run_cycle(
        &mut self,
        arbiter: &SensorArbiter,
        fan: &mut impl FanPort,
        delay: &mut impl DelayPort,
        wdt: &mut impl WatchdogPort,
        timestamp: CalendarTime,
    ) -> AggregatedReading {
        let cfg = self.config.sampling;
        self.cycle_count += 1;
        info!(
            "cycle {}: purge {}s, settle {}ms, {} samples @ {}ms",
            self.cycle_count, cfg.purge_secs, cfg.settle_ms, cfg.sample_count, cfg.sample_interval_ms
        );

        // Purge: run the fan for the configured span, feeding the watchdog
        // once a second so the purge never trips the watchdog.
        fan.set(true);
        for _ in 0..cfg.purge_secs {
            delay.delay_ms(1000);
            wdt.feed();
        }
        fan.set(false);

        // Settle: let the chamber air go still before the first sample.
        delay.delay_ms(cfg.settle_ms);
        wdt.feed();

        let sample_count = usize::from(cfg.sample_count).min(MAX_SAMPLES);
        let mut samples: heapless::Vec<RawSample, MAX_SAMPLES> = heapless::Vec::new();
        let mut climate = None;

        arbiter.with_exclusive(|channel| {
            climate = channel.read_climate();

            for i in 0..sample_count {
                let sample = match channel.sample_co2(cfg.frame_timeout_ms) {
                    Ok(ppm) => RawSample::Valid(ppm),
                    Err(e) => {
                        debug!("sample {}/{} invalid: {}", i + 1, sample_count, e);
                        RawSample::Invalid
                    }
                };
                let _ = samples.push(sample);
                wdt.feed();
                if i + 1 < sample_count {
                    delay.delay_ms(cfg.sample_interval_ms);
                }
            }
        });

        let valid = aggregate::valid_count(&samples);
        let median = aggregate::median_concentration(&samples);
        match median {
            Some(ppm) => info!(
                "cycle {}: median {} ppm ({}/{} valid)",
                self.cycle_count, ppm, valid, sample_count
            ),
            None => warn!(
                "cycle {}: no publishable median ({}/{} valid)",
                self.cycle_count, valid, sample_count
            ),
        }

        AggregatedReading {
            concentration_median: median,
            valid_count: valid,
            total_count: sample_count as u16,
            temperature_c: climate.map(|c| c.temperature_c),
            humidity_pct: climate.map(|c| c.humidity_pct),
            timestamp,
        }
    }

    fn build_record(&self, reading: AggregatedReading) -> MeasurementRecord {
        let shift = if self.config.site.is_empty() {
            None
        } else {
            self.scheduler.window_index(reading.timestamp.hour)
        };
        MeasurementRecord {
            reading,
            site: self.config.site.clone(),
            shift,
        }
    }
}
