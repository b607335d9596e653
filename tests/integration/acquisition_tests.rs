//! Integration tests: AcquisitionService → arbiter → sinks.
//!
//! Drives full controller iterations against scripted sensors and mock
//! adapters, checking the purge/settle/sample pipeline, slot debounce,
//! degraded records, and sink failure tolerance.

#![cfg(not(target_os = "espidf"))]

use co2logger::app::service::AcquisitionService;
use co2logger::arbiter::SensorArbiter;
use co2logger::clock::CalendarTime;
use co2logger::config::LoggerConfig;
use co2logger::error::ClockError;
use co2logger::sensors::climate::{ClimateReading, ClimateSensor};
use co2logger::sensors::co2::{make_response, Co2Sensor};
use co2logger::sensors::SensorChannel;

use crate::mock_hw::{MockDelay, MockWdt, RecordingFan, RecordingSink, ScriptedClock};

// ── Fixtures ──────────────────────────────────────────────────

/// Shrunk pipeline so a full cycle runs in microseconds on the host.
fn bench_config() -> LoggerConfig {
    let mut cfg = LoggerConfig::default();
    cfg.sampling.sample_count = 5;
    cfg.sampling.sample_interval_ms = 10;
    cfg.sampling.purge_secs = 2;
    cfg.sampling.settle_ms = 20;
    cfg
}

fn arbiter() -> SensorArbiter {
    let cfg = bench_config();
    SensorArbiter::new(SensorChannel::new(
        Co2Sensor::new(cfg.sampling.ppm_min, cfg.sampling.ppm_max),
        ClimateSensor::new(0),
        cfg.sampling.frame_timeout_ms,
    ))
}

fn at(hour: u8, minute: u8, second: u8) -> CalendarTime {
    CalendarTime::new(2026, 8, 30, hour, minute, second).unwrap()
}

/// Queue `ppms` as sensor responses plus one climate reading.
fn script_sensors(arb: &SensorArbiter, ppms: &[u16]) {
    arb.with_exclusive(|ch| {
        ch.climate.sim_set_reading(Ok(ClimateReading {
            temperature_c: 23.4,
            humidity_pct: 55.1,
        }));
        for &ppm in ppms {
            ch.co2.sim_push_response(&make_response(ppm));
        }
    });
}

// ── Full-cycle behaviour ──────────────────────────────────────

#[test]
fn due_slot_runs_cycle_and_appends_record() {
    let arb = arbiter();
    script_sensors(&arb, &[430, 410, 450, 400, 420]);

    let mut clock = ScriptedClock::new(Ok(at(7, 30, 0)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let mut svc = AcquisitionService::new(bench_config());

    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    assert_eq!(svc.cycle_count(), 1);
    assert_eq!(sink.records.len(), 1);
    let rec = &sink.records[0];
    assert_eq!(rec.reading.concentration_median, Some(420));
    assert_eq!(rec.reading.valid_count, 5);
    assert_eq!(rec.reading.total_count, 5);
    assert_eq!(rec.reading.temperature_c, Some(23.4));
    assert_eq!(sink.rows()[0], "2026-08-30;07:30:00;420;23.4;55.1");

    // Fan ran exactly one purge: on, then off before sampling.
    assert_eq!(fan.transitions, vec![true, false]);
    assert!(!fan.is_on());

    // Purge (2 s) + settle (20 ms) + 4 inter-sample gaps of 10 ms.
    assert_eq!(delay.total_ms, 2000 + 20 + 40);
    assert!(wdt.feeds >= 5);
}

#[test]
fn off_boundary_tick_does_nothing() {
    let arb = arbiter();
    let mut clock = ScriptedClock::new(Ok(at(7, 12, 0)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let mut svc = AcquisitionService::new(bench_config());

    let plan = svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    assert_eq!(svc.cycle_count(), 0);
    assert!(sink.records.is_empty());
    assert!(fan.transitions.is_empty());
    // 07:12:00 → 07:30:00 is exactly 18 minutes.
    assert_eq!(plan.duration_secs, 1080);
}

#[test]
fn slot_fires_at_most_once() {
    let arb = arbiter();
    script_sensors(&arb, &[400, 400, 400, 400, 400]);

    let mut clock = ScriptedClock::new(Ok(at(7, 0, 5)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let mut svc = AcquisitionService::new(bench_config());

    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);
    // Still inside the same boundary minute.
    clock.push(Ok(at(7, 0, 45)));
    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    assert_eq!(svc.cycle_count(), 1);
    assert_eq!(sink.records.len(), 1);
}

#[test]
fn outside_window_boundary_is_ignored() {
    let arb = arbiter();
    let mut clock = ScriptedClock::new(Ok(at(14, 30, 0)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let mut svc = AcquisitionService::new(bench_config());

    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    assert_eq!(svc.cycle_count(), 0);
    assert!(sink.records.is_empty());
}

// ── Degraded cycles ───────────────────────────────────────────

#[test]
fn sparse_valid_batch_records_sentinels() {
    let arb = arbiter();
    // Only 2 of 5 frames arrive, the rest time out; climate also fails.
    arb.with_exclusive(|ch| {
        ch.co2.sim_push_response(&make_response(500));
        ch.co2.sim_push_response(&make_response(510));
    });

    let mut clock = ScriptedClock::new(Ok(at(11, 0, 0)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let mut svc = AcquisitionService::new(bench_config());

    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    assert_eq!(sink.records.len(), 1);
    let rec = &sink.records[0];
    assert_eq!(rec.reading.concentration_median, None);
    assert_eq!(rec.reading.valid_count, 2);
    assert_eq!(rec.reading.total_count, 5);
    assert_eq!(sink.rows()[0], "2026-08-30;11:00:00;-1;-99.0;-99.0");
}

#[test]
fn out_of_range_samples_count_as_invalid() {
    let arb = arbiter();
    // Two implausible spikes among five frames; median over valid only.
    script_sensors(&arb, &[410, 6000, 420, 6000, 430]);

    let mut clock = ScriptedClock::new(Ok(at(16, 30, 0)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let mut svc = AcquisitionService::new(bench_config());

    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    let rec = &sink.records[0];
    assert_eq!(rec.reading.concentration_median, Some(420));
    assert_eq!(rec.reading.valid_count, 3);
}

#[test]
fn sink_failure_drops_row_but_cycle_completes() {
    let arb = arbiter();
    script_sensors(&arb, &[400, 400, 400, 400, 400]);

    let mut clock = ScriptedClock::new(Ok(at(7, 30, 0)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    sink.fail_next = true;
    let mut svc = AcquisitionService::new(bench_config());

    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    // The cycle ran and the slot is still debounced; only the row is lost.
    assert_eq!(svc.cycle_count(), 1);
    assert!(sink.records.is_empty());
    clock.push(Ok(at(7, 30, 30)));
    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);
    assert_eq!(svc.cycle_count(), 1);
}

#[test]
fn unreadable_clock_skips_cycle_and_plans_fallback() {
    let arb = arbiter();
    let mut clock = ScriptedClock::new(Err(ClockError::Halted));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let cfg = bench_config();
    let fallback = cfg.power.fallback_secs;
    let mut svc = AcquisitionService::new(cfg);

    let plan = svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    assert_eq!(svc.cycle_count(), 0);
    assert!(sink.records.is_empty());
    assert_eq!(plan.duration_secs, fallback);
}

// ── Site tagging ──────────────────────────────────────────────

#[test]
fn site_tag_adds_site_and_shift_columns() {
    let arb = arbiter();
    script_sensors(&arb, &[410, 410, 410, 410, 410]);

    let mut cfg = bench_config();
    cfg.site = heapless::String::try_from("field-2").unwrap();

    let mut clock = ScriptedClock::new(Ok(at(11, 30, 0)));
    let mut fan = RecordingFan::new();
    let mut delay = MockDelay::new();
    let mut wdt = MockWdt::new();
    let mut sink = RecordingSink::new();
    let mut svc = AcquisitionService::new(cfg);

    svc.step(&mut clock, &arb, &mut fan, &mut delay, &mut wdt, &mut sink);

    // 11:30 falls in the second window.
    assert_eq!(sink.records[0].shift, Some(2));
    assert_eq!(sink.rows()[0], "2026-08-30;11:30:00;410;23.4;55.1;field-2;2");
}
