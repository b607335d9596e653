//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without touching real GPIO/UART registers or sleeping for real.

use std::collections::VecDeque;

use co2logger::app::ports::{ClockPort, DelayPort, FanPort, RecordSink, StorageError, WatchdogPort};
use co2logger::clock::CalendarTime;
use co2logger::error::ClockError;
use co2logger::record::MeasurementRecord;

// ── Fan call record ───────────────────────────────────────────

pub struct RecordingFan {
    pub transitions: Vec<bool>,
}

#[allow(dead_code)]
impl RecordingFan {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    pub fn is_on(&self) -> bool {
        *self.transitions.last().unwrap_or(&false)
    }
}

impl FanPort for RecordingFan {
    fn set(&mut self, on: bool) {
        self.transitions.push(on);
    }
}

// ── Instant delay ─────────────────────────────────────────────

/// Never actually sleeps; accumulates what the caller asked for so tests
/// can assert on the total purge/settle/interval budget.
pub struct MockDelay {
    pub total_ms: u64,
}

#[allow(dead_code)]
impl MockDelay {
    pub fn new() -> Self {
        Self { total_ms: 0 }
    }
}

impl DelayPort for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

// ── Scripted clock ────────────────────────────────────────────

/// Returns pre-scripted times in order; the last entry repeats once the
/// script runs out.
pub struct ScriptedClock {
    script: VecDeque<Result<CalendarTime, ClockError>>,
    last: Result<CalendarTime, ClockError>,
}

#[allow(dead_code)]
impl ScriptedClock {
    pub fn new(first: Result<CalendarTime, ClockError>) -> Self {
        Self {
            script: VecDeque::new(),
            last: first,
        }
    }

    pub fn push(&mut self, next: Result<CalendarTime, ClockError>) {
        self.script.push_back(next);
    }
}

impl ClockPort for ScriptedClock {
    fn now(&mut self) -> Result<CalendarTime, ClockError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}

// ── Recording sink ────────────────────────────────────────────

pub struct RecordingSink {
    pub records: Vec<MeasurementRecord>,
    pub fail_next: bool,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            fail_next: false,
        }
    }

    pub fn rows(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.csv_row().as_str().to_owned())
            .collect()
    }
}

impl RecordSink for RecordingSink {
    fn append(&mut self, record: &MeasurementRecord) -> Result<(), StorageError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(StorageError::IoError);
        }
        self.records.push(record.clone());
        Ok(())
    }
}

// ── Counting watchdog ─────────────────────────────────────────

pub struct MockWdt {
    pub feeds: u32,
}

#[allow(dead_code)]
impl MockWdt {
    pub fn new() -> Self {
        Self { feeds: 0 }
    }
}

impl WatchdogPort for MockWdt {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}
