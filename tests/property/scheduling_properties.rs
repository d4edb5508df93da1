// Property-based tests for recurring slot generation, pattern colours and
// travel fees

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use coach_planner::models::recurrence::{QuotaPolicy, RecurrencePattern, ScheduleSpec, SlotTimes};
use coach_planner::models::travel::TravelPolicy;
use coach_planner::services::error::SchedulingError;
use coach_planner::services::palette::ColorAssigner;
use coach_planner::services::schedule::SlotSequencer;
use coach_planner::services::travel::compute_fee;

fn start_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

fn pattern() -> impl Strategy<Value = RecurrencePattern> {
    prop::collection::vec(0u8..7, 1..5).prop_map(|days| RecurrencePattern::new(days).unwrap())
}

proptest! {
    /// Exactly `n` blocks, each on a pattern weekday, in strictly increasing date order
    #[test]
    fn prop_sequencer_fills_quota_in_order(
        patterns in prop::collection::vec(pattern(), 1..4),
        total in 1u32..60,
        start in start_date(),
        include_start in any::<bool>(),
    ) {
        let spec = ScheduleSpec::new(patterns.clone(), total, 45, start)
            .with_start_date_included(include_start);
        let blocks = SlotSequencer::new()
            .generate(&spec, &SlotTimes::uniform(8 * 60))
            .unwrap();

        prop_assert_eq!(blocks.len() as u32, total);
        for block in &blocks {
            prop_assert!(patterns.iter().any(|p| p.matches(block.date)));
            prop_assert!(if include_start { block.date >= start } else { block.date > start }, "block date {} not after start {}", block.date, start);
            prop_assert_eq!(block.end_minute - block.start_minute, 45);
        }
        for pair in blocks.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }

    /// Per-group quotas add up to the total and never exceed an even share plus one
    #[test]
    fn prop_per_group_split_is_even(
        total in 1u32..40,
        start in start_date(),
    ) {
        let groups = vec![
            RecurrencePattern::new([1]).unwrap(),
            RecurrencePattern::new([3]).unwrap(),
            RecurrencePattern::new([5]).unwrap(),
        ];
        let spec = ScheduleSpec::new(groups.clone(), total, 60, start)
            .with_quota_policy(QuotaPolicy::PerGroup);
        let blocks = SlotSequencer::new()
            .generate(&spec, &SlotTimes::uniform(9 * 60))
            .unwrap();

        prop_assert_eq!(blocks.len() as u32, total);
        let share = total / 3;
        for group in &groups {
            let count = blocks.iter().filter(|b| b.pattern.as_ref() == Some(group)).count() as u32;
            prop_assert!(count == share || count == share + 1);
        }
    }

    /// A horizon shorter than a week can never fit more sessions than matching days
    #[test]
    fn prop_horizon_cap_reports_progress(weekday in 0u8..7, start in start_date()) {
        let spec = ScheduleSpec::new(vec![RecurrencePattern::new([weekday]).unwrap()], 3, 60, start);
        let err = SlotSequencer::with_horizon(7)
            .generate(&spec, &SlotTimes::uniform(9 * 60))
            .unwrap_err();
        match err {
            SchedulingError::IterationCapExceeded { horizon_days, emitted, requested } => {
                prop_assert_eq!(horizon_days, 7);
                prop_assert_eq!(emitted, 1);
                prop_assert_eq!(requested, 3);
            }
            other => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Colour depends on the set of weekdays, not on their order or repetition
    #[test]
    fn prop_color_is_order_independent(days in prop::collection::vec(0u8..7, 1..7), seed in any::<u64>()) {
        let mut shuffled = days.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();
        shuffled.push(days[0]);

        prop_assert_eq!(ColorAssigner::color_for(&days), ColorAssigner::color_for(&shuffled));
        prop_assert_eq!(ColorAssigner::color_for(&days), ColorAssigner::color_for(&days));
    }

    /// Inside the free radius travel is free
    #[test]
    fn prop_fee_zero_inside_free_radius(free in 0.0f64..20.0, fraction in 0.0f64..=1.0) {
        let policy = TravelPolicy::new(free, free + 10.0, 10_000.0).unwrap();
        prop_assert_eq!(compute_fee(free * fraction, &policy).unwrap(), 0);
    }

    /// Anything past the maximum is rejected as out of range
    #[test]
    fn prop_fee_rejects_beyond_max(max in 1.0f64..50.0, excess in 0.001f64..100.0) {
        let policy = TravelPolicy::new(0.0, max, 500.0).unwrap();
        let rejected = matches!(
            compute_fee(max + excess, &policy),
            Err(SchedulingError::OutOfRange { .. })
        );
        prop_assert!(rejected);
    }

    /// Fees never drop as the distance grows
    #[test]
    fn prop_fee_is_monotonic(a in 0.0f64..=10.0, b in 0.0f64..=10.0) {
        let policy = TravelPolicy::new(6.0, 10.0, 10_000.0).unwrap();
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(compute_fee(near, &policy).unwrap() <= compute_fee(far, &policy).unwrap());
    }
}

#[test]
fn test_sessions_land_on_weekdays_across_year_end() {
    let spec = ScheduleSpec::new(
        vec![RecurrencePattern::new([2, 4]).unwrap()],
        4,
        60,
        NaiveDate::from_ymd_opt(2025, 12, 28).unwrap(),
    );
    let blocks = SlotSequencer::new()
        .generate(&spec, &SlotTimes::uniform(18 * 60))
        .unwrap();
    let dates: Vec<String> = blocks.iter().map(|b| b.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-12-30", "2026-01-01", "2026-01-06", "2026-01-08"]);
    assert!(blocks.iter().all(|b| b.date.weekday().num_days_from_sunday() % 2 == 0));
}
