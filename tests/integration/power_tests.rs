//! Integration tests: sleep planning across whole schedule days.
//!
//! Walks the planner through realistic clock sequences and checks that
//! the plan durations always land the next wake on a slot boundary.

#![cfg(not(target_os = "espidf"))]

use co2logger::clock::CalendarTime;
use co2logger::config::PowerPolicy;
use co2logger::power::{plan_sleep, DayPhase, SleepMode};
use co2logger::power::day_phase;
use co2logger::scheduler::SlotCadence;

fn at(hour: u8, minute: u8, second: u8) -> CalendarTime {
    CalendarTime::new(2026, 8, 30, hour, minute, second).unwrap()
}

fn policy() -> PowerPolicy {
    PowerPolicy::default()
}

#[test]
fn daytime_plans_stay_awake_to_the_boundary() {
    let plan = plan_sleep(Some(&at(7, 12, 0)), &policy(), SlotCadence::HalfHour);
    assert_eq!(plan.mode, SleepMode::StayAwake);
    assert_eq!(plan.duration_secs, 1080);
}

#[test]
fn nighttime_plans_light_sleep() {
    let plan = plan_sleep(Some(&at(22, 0, 17)), &policy(), SlotCadence::HalfHour);
    assert_eq!(plan.mode, SleepMode::LightSleep);
    assert_eq!(plan.duration_secs, 1783);
}

#[test]
fn deep_sleep_opt_in_overrides_day_phase() {
    let mut pol = policy();
    pol.deep_sleep = true;
    let day = plan_sleep(Some(&at(10, 0, 0)), &pol, SlotCadence::HalfHour);
    let night = plan_sleep(Some(&at(23, 0, 0)), &pol, SlotCadence::HalfHour);
    assert_eq!(day.mode, SleepMode::DeepSleep);
    assert_eq!(night.mode, SleepMode::DeepSleep);
}

#[test]
fn near_boundary_remainder_falls_back() {
    // 2 s to the boundary is under the 5 s guard.
    let plan = plan_sleep(Some(&at(7, 29, 58)), &policy(), SlotCadence::HalfHour);
    assert_eq!(plan.duration_secs, policy().fallback_secs);
}

#[test]
fn walking_a_full_day_always_lands_on_boundaries() {
    let pol = policy();
    let mut secs_of_day: u32 = 6 * 3600 + 40 * 60 + 13; // 06:40:13
    let mut wakes = 0;

    while secs_of_day < 23 * 3600 {
        let t = at(
            (secs_of_day / 3600) as u8,
            (secs_of_day / 60 % 60) as u8,
            (secs_of_day % 60) as u8,
        );
        let plan = plan_sleep(Some(&t), &pol, SlotCadence::HalfHour);
        assert!(plan.duration_secs >= pol.guard_secs);
        assert!(plan.duration_secs <= 1800);

        secs_of_day += plan.duration_secs;
        // Every wake after the first lands exactly on a half-hour mark.
        if wakes > 0 {
            assert_eq!(secs_of_day % 1800, 0, "woke off-boundary at {}", secs_of_day);
        }
        wakes += 1;
    }
    assert!(wakes > 30);
}

#[test]
fn bench_cadence_wakes_every_fifteen_seconds() {
    let plan = plan_sleep(Some(&at(12, 0, 7)), &policy(), SlotCadence::RapidBench);
    assert_eq!(plan.duration_secs, 8);

    // Exactly on a mark: one full period, never zero.
    let plan = plan_sleep(Some(&at(12, 0, 30)), &policy(), SlotCadence::RapidBench);
    assert_eq!(plan.duration_secs, 15);
}

#[test]
fn day_span_edges_are_half_open() {
    let pol = policy();
    assert_eq!(day_phase(&at(6, 29, 59), &pol), DayPhase::Night);
    assert_eq!(day_phase(&at(6, 30, 0), &pol), DayPhase::Day);
    assert_eq!(day_phase(&at(18, 29, 59), &pol), DayPhase::Day);
    assert_eq!(day_phase(&at(18, 30, 0), &pol), DayPhase::Night);
}
