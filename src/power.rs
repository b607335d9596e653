//! Power state controller — sleep planning and the sleep transitions.
//!
//! After every controller iteration the loop recomputes a fresh
//! [`SleepPlan`]: how long until the next slot boundary, and which power
//! state fits the time of day.
//!
//! ```text
//!   Running ──▶ ComputeSleep ──▶ StayAwake   (day: radio stays reachable)
//!                            ├─▶ LightSleep  (night: CPU+radio suspended)
//!                            └─▶ DeepSleep   (opt-in: full power-off,
//!                                             timer + button wake armed)
//! ```
//!
//! The plan is never persisted across cycles; an invalid clock falls back to
//! `StayAwake` for the default duration.  The stay-awake wait is a single
//! timed wait, not a 1 s poll loop.

use log::{info, warn};

use crate::clock::CalendarTime;
use crate::config::PowerPolicy;
use crate::scheduler::SlotCadence;

// ═══════════════════════════════════════════════════════════════
//  Plan types
// ═══════════════════════════════════════════════════════════════

/// Which power state to enter until the next boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepMode {
    /// Plain timed wait; everything stays powered.
    StayAwake,
    /// CPU and radio suspended, RAM retained, timer wake.
    LightSleep,
    /// Full power-off.  Arms a timer wake *and* the operator button wake.
    DeepSleep,
}

/// One freshly computed sleep decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepPlan {
    pub mode: SleepMode,
    pub duration_secs: u32,
}

/// Day/night classification of an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Day,
    Night,
}

/// Why the firmware is running right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Cold boot / power applied.
    PowerOn,
    /// Deep-sleep timer expired — resume the normal schedule.
    Timer,
    /// Operator pressed the wake button — open an operator window.
    Button,
}

// ═══════════════════════════════════════════════════════════════
//  Pure planning
// ═══════════════════════════════════════════════════════════════

/// Seconds until the next slot boundary strictly after `now`.
///
/// Half-hour cadence: the next minute-0/minute-30 mark.  Bench cadence:
/// the next 15 s mark.  An instant exactly on a boundary yields one full
/// period, never zero.
pub fn secs_to_next_boundary(now: &CalendarTime, cadence: SlotCadence) -> u32 {
    match cadence {
        SlotCadence::HalfHour => {
            let into_period = u32::from(now.minute % 30) * 60 + u32::from(now.second);
            1800 - into_period
        }
        SlotCadence::RapidBench => 15 - u32::from(now.second) % 15,
    }
}

/// Classify `now` against the policy's daytime span (half-open:
/// `day_start <= now < day_end`).
pub fn day_phase(now: &CalendarTime, policy: &PowerPolicy) -> DayPhase {
    let sod = now.seconds_of_day();
    let start = u32::from(policy.day_start_hour) * 3600 + u32::from(policy.day_start_min) * 60;
    let end = u32::from(policy.day_end_hour) * 3600 + u32::from(policy.day_end_min) * 60;
    if sod >= start && sod < end {
        DayPhase::Day
    } else {
        DayPhase::Night
    }
}

/// Compute the sleep plan for this iteration.
///
/// `now = None` means the clock is unreliable — plan the fallback duration
/// awake rather than guessing a boundary.
pub fn plan_sleep(
    now: Option<&CalendarTime>,
    policy: &PowerPolicy,
    cadence: SlotCadence,
) -> SleepPlan {
    let Some(now) = now else {
        warn!("power: no reliable time, staying awake for {}s", policy.fallback_secs);
        return SleepPlan {
            mode: SleepMode::StayAwake,
            duration_secs: policy.fallback_secs,
        };
    };

    let raw = secs_to_next_boundary(now, cadence);
    let duration_secs = if raw < policy.guard_secs {
        // The boundary is effectively now; waiting the raw remainder would
        // wake mid-boundary and miss the slot.
        policy.fallback_secs
    } else {
        raw
    };

    let mode = if policy.deep_sleep {
        SleepMode::DeepSleep
    } else {
        match day_phase(now, policy) {
            DayPhase::Day => SleepMode::StayAwake,
            DayPhase::Night => SleepMode::LightSleep,
        }
    };

    SleepPlan {
        mode,
        duration_secs,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Power manager — executes the plan
// ═══════════════════════════════════════════════════════════════

/// Drives the actual sleep transitions.  On the host every mode degrades to
/// a plain `thread::sleep` so the controller loop is fully testable.
pub struct PowerManager {
    button_gpio: i32,
}

impl PowerManager {
    pub fn new(button_gpio: i32) -> Self {
        Self { button_gpio }
    }

    /// Classify why this boot happened.
    #[cfg(target_os = "espidf")]
    pub fn determine_wake_cause(&self) -> WakeCause {
        use esp_idf_svc::sys::*;
        // SAFETY: read-only query of the wakeup cause register.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        match cause {
            x if x == esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
            x if x == esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0 => WakeCause::Button,
            _ => WakeCause::PowerOn,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn determine_wake_cause(&self) -> WakeCause {
        WakeCause::PowerOn
    }

    /// Execute the plan.  Returns after the wait for `StayAwake` and
    /// `LightSleep`; `DeepSleep` does not return on hardware.
    pub fn execute(&self, plan: SleepPlan) {
        match plan.mode {
            SleepMode::StayAwake => {
                info!("power: staying awake {}s until next slot", plan.duration_secs);
                self.timed_wait(plan.duration_secs);
            }
            SleepMode::LightSleep => {
                info!("power: light sleep {}s", plan.duration_secs);
                self.light_sleep(plan.duration_secs);
            }
            SleepMode::DeepSleep => {
                info!(
                    "power: deep sleep {}s (timer + button wake armed)",
                    plan.duration_secs
                );
                self.deep_sleep(plan.duration_secs);
            }
        }
    }

    /// One explicit timed wait.  Suspension point, not a poll loop.
    pub fn timed_wait(&self, secs: u32) {
        std::thread::sleep(std::time::Duration::from_secs(u64::from(secs)));
    }

    #[cfg(target_os = "espidf")]
    fn light_sleep(&self, secs: u32) {
        use esp_idf_svc::sys::*;
        // SAFETY: single-threaded controller context; the sleep API requires
        // a wake source to be armed before esp_light_sleep_start.
        unsafe {
            esp_sleep_enable_timer_wakeup(u64::from(secs) * 1_000_000);
            esp_light_sleep_start();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn light_sleep(&self, secs: u32) {
        self.timed_wait(secs);
    }

    #[cfg(target_os = "espidf")]
    fn deep_sleep(&self, secs: u32) -> ! {
        use esp_idf_svc::sys::*;
        // SAFETY: arming wake sources then entering deep sleep; execution
        // resumes at boot, never here.
        unsafe {
            esp_sleep_enable_timer_wakeup(u64::from(secs) * 1_000_000);
            // Button is active-low: wake on level 0.
            esp_sleep_enable_ext0_wakeup(self.button_gpio, 0);
            esp_deep_sleep_start();
        }
        unreachable!("esp_deep_sleep_start returned");
    }

    #[cfg(not(target_os = "espidf"))]
    fn deep_sleep(&self, secs: u32) {
        // Host simulation: deep sleep is indistinguishable from a wait.
        let _ = self.button_gpio;
        self.timed_wait(secs);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
