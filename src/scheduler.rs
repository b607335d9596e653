//! Measurement-slot scheduler.
//!
//! Pure policy: given "now" and the memory of the last fired slot, decide
//! whether the current instant is a due measurement slot.  The decision is
//! debounced so each boundary fires at most once even though the control
//! loop ticks every second, and re-armed as soon as the clock moves off the
//! boundary.
//!
//! ```text
//!   ClockPort ──▶ CalendarTime ──▶ SlotScheduler.is_slot_due()
//!                                        │
//!                              true ──▶ acquisition cycle
//!                                        │ (completes)
//!                                        ▼
//!                                  ScheduleState.mark_fired()
//! ```
//!
//! `mark_fired` is the *caller's* job, after acquisition completes — a crash
//! mid-cycle must not silently mark the slot as done.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clock::CalendarTime;

/// Maximum number of daily operating windows (stack-allocated).
pub const MAX_WINDOWS: usize = 4;

// ═══════════════════════════════════════════════════════════════
//  Policy types
// ═══════════════════════════════════════════════════════════════

/// An inclusive daily hour range during which slots are active,
/// e.g. `7..=9` for the morning window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    /// First active hour (0–23 inclusive).
    pub start_hour: u8,
    /// Last active hour (0–23 inclusive).
    pub end_hour: u8,
}

impl HourWindow {
    pub fn contains(&self, hour: u8) -> bool {
        hour >= self.start_hour && hour <= self.end_hour
    }
}

/// How often slot boundaries occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotCadence {
    /// Production cadence: one slot per half hour (minute 0 and 30).
    HalfHour,
    /// Accelerated bench cadence: one slot every 15 seconds.  Used to
    /// exercise a full day of schedule behaviour in minutes on the bench.
    RapidBench,
}

/// The runtime scheduling policy — windows plus cadence.  Deployments pick
/// production or bench behaviour here, without recompilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerPolicy {
    pub windows: heapless::Vec<HourWindow, MAX_WINDOWS>,
    pub cadence: SlotCadence,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        // Original field deployment: morning, midday and afternoon windows.
        let mut windows = heapless::Vec::new();
        let _ = windows.push(HourWindow { start_hour: 7, end_hour: 9 });
        let _ = windows.push(HourWindow { start_hour: 11, end_hour: 13 });
        let _ = windows.push(HourWindow { start_hour: 16, end_hour: 18 });
        Self {
            windows,
            cadence: SlotCadence::HalfHour,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Slot identity and debounce state
// ═══════════════════════════════════════════════════════════════

/// The identity of one scheduled boundary.  For the half-hour cadence the
/// second is always 0; for the bench cadence it participates in the identity
/// so consecutive 15 s marks are distinct slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSlot {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Debounce memory, owned by the scheduler's thread of control.
///
/// Replaces the per-revision "measurement taken for this slot" booleans that
/// kept reappearing in the field firmware with one value that is cleared on
/// every off-boundary tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleState {
    last_fired: Option<MeasurementSlot>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `slot` completed acquisition.  Call only after the cycle
    /// finished and the record was handed to the sink.
    pub fn mark_fired(&mut self, slot: MeasurementSlot) {
        self.last_fired = Some(slot);
    }

    pub fn last_fired(&self) -> Option<MeasurementSlot> {
        self.last_fired
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// The slot scheduler.  Holds the policy; the mutable debounce state is
/// passed in by the caller so ownership stays with the control loop.
pub struct SlotScheduler {
    policy: SchedulerPolicy,
}

impl SlotScheduler {
    pub fn new(policy: SchedulerPolicy) -> Self {
        Self { policy }
    }

    /// The slot identity for `now`, if `now` sits exactly on a boundary.
    pub fn slot_at(&self, now: &CalendarTime) -> Option<MeasurementSlot> {
        match self.policy.cadence {
            SlotCadence::HalfHour => {
                (now.minute == 0 || now.minute == 30).then(|| MeasurementSlot {
                    hour: now.hour,
                    minute: now.minute,
                    second: 0,
                })
            }
            SlotCadence::RapidBench => (now.second % 15 == 0).then(|| MeasurementSlot {
                hour: now.hour,
                minute: now.minute,
                second: now.second,
            }),
        }
    }

    /// Whether `now.hour` falls inside any configured operating window.
    pub fn in_window(&self, hour: u8) -> bool {
        self.policy.windows.iter().any(|w| w.contains(hour))
    }

    /// 1-based index of the window containing `hour` — the `Shift` column of
    /// the persisted record.
    pub fn window_index(&self, hour: u8) -> Option<u8> {
        self.policy
            .windows
            .iter()
            .position(|w| w.contains(hour))
            .map(|i| i as u8 + 1)
    }

    /// Decide whether `now` is a due measurement slot.
    ///
    /// Fires only on a boundary, inside a window, and when the boundary has
    /// not already fired.  Off-boundary ticks clear the debounce memory so
    /// the *next* boundary can fire even if the previous acquisition overran
    /// into it — within one boundary a double fire is impossible because
    /// `mark_fired` pins that slot until the clock leaves it.
    pub fn is_slot_due(&self, now: &CalendarTime, state: &mut ScheduleState) -> bool {
        let Some(slot) = self.slot_at(now) else {
            // Off boundary: re-arm for the next one.
            state.last_fired = None;
            return false;
        };

        if !self.in_window(now.hour) {
            return false;
        }

        if state.last_fired == Some(slot) {
            debug!(
                "slot {:02}:{:02} already fired, debounced",
                slot.hour, slot.minute
            );
            return false;
        }

        true
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u8, minute: u8, second: u8) -> CalendarTime {
        CalendarTime::new(2026, 8, 30, hour, minute, second).unwrap()
    }

    fn production() -> SlotScheduler {
        SlotScheduler::new(SchedulerPolicy::default())
    }

    #[test]
    fn fires_once_per_boundary() {
        let sched = production();
        let mut state = ScheduleState::new();

        // 07:00:05 — boundary, in window, not yet fired.
        let now = at(7, 0, 5);
        assert!(sched.is_slot_due(&now, &mut state));
        state.mark_fired(sched.slot_at(&now).unwrap());

        // Still the same boundary — debounced.
        assert!(!sched.is_slot_due(&at(7, 0, 45), &mut state));

        // Next boundary fires again.
        assert!(sched.is_slot_due(&at(7, 30, 0), &mut state));
    }

    #[test]
    fn off_boundary_clears_debounce() {
        let sched = production();
        let mut state = ScheduleState::new();

        let now = at(7, 30, 0);
        assert!(sched.is_slot_due(&now, &mut state));
        state.mark_fired(sched.slot_at(&now).unwrap());
        assert!(state.last_fired().is_some());

        // A tick at 07:31 leaves the boundary and re-arms.
        assert!(!sched.is_slot_due(&at(7, 31, 0), &mut state));
        assert!(state.last_fired().is_none());
    }

    #[test]
    fn overrun_cannot_double_fire_but_next_boundary_still_fires() {
        let sched = production();
        let mut state = ScheduleState::new();

        // Cycle fires at 08:00 and overruns past 08:01 — the first check
        // after the cycle is still inside the 08:00 minute.
        let fire = at(8, 0, 0);
        assert!(sched.is_slot_due(&fire, &mut state));
        state.mark_fired(sched.slot_at(&fire).unwrap());
        assert!(!sched.is_slot_due(&at(8, 0, 59), &mut state));

        // The following boundary fires on schedule.
        assert!(sched.is_slot_due(&at(8, 30, 2), &mut state));
    }

    #[test]
    fn outside_window_never_due() {
        let sched = production();
        let mut state = ScheduleState::new();

        // 10:00 and 14:30 are boundaries but sit between windows.
        assert!(!sched.is_slot_due(&at(10, 0, 0), &mut state));
        assert!(!sched.is_slot_due(&at(14, 30, 0), &mut state));
        // 03:00 is outside every window.
        assert!(!sched.is_slot_due(&at(3, 0, 0), &mut state));
    }

    #[test]
    fn window_edges_inclusive() {
        let sched = production();
        let mut state = ScheduleState::new();

        // end_hour = 9 is inclusive: 09:30 still fires.
        assert!(sched.is_slot_due(&at(9, 30, 0), &mut state));
        state.mark_fired(sched.slot_at(&at(9, 30, 0)).unwrap());
        // 10:00 does not.
        assert!(!sched.is_slot_due(&at(10, 0, 0), &mut state));
    }

    #[test]
    fn window_index_is_one_based_shift() {
        let sched = production();
        assert_eq!(sched.window_index(8), Some(1));
        assert_eq!(sched.window_index(12), Some(2));
        assert_eq!(sched.window_index(17), Some(3));
        assert_eq!(sched.window_index(10), None);
    }

    #[test]
    fn rapid_bench_slots_every_15s() {
        let mut policy = SchedulerPolicy::default();
        policy.cadence = SlotCadence::RapidBench;
        policy.windows.clear();
        let _ = policy.windows.push(HourWindow { start_hour: 0, end_hour: 23 });
        let sched = SlotScheduler::new(policy);
        let mut state = ScheduleState::new();

        let s0 = at(10, 2, 15);
        assert!(sched.is_slot_due(&s0, &mut state));
        state.mark_fired(sched.slot_at(&s0).unwrap());

        // Same mark: debounced.  Next 15 s mark: distinct slot.
        assert!(!sched.is_slot_due(&at(10, 2, 15), &mut state));
        assert!(sched.is_slot_due(&at(10, 2, 30), &mut state));

        // Seconds 1–14 are off-boundary.
        assert!(!sched.is_slot_due(&at(10, 2, 44), &mut state));
    }
}
