// Property-based tests for week windows, pixel/minute mapping and gesture snapping

use chrono::{Datelike, NaiveDate, Weekday};
use proptest::prelude::*;

use coach_planner::services::session::board::SessionBoard;
use coach_planner::services::session::dispatch::GatewayRequest;
use coach_planner::ui_egui::drag::{snap_to_step, DragController, GestureOutcome, PointerTarget};
use coach_planner::ui_egui::time_scale::TimeScale;
use coach_planner::utils::date::WeekWindow;

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (-20_000i64..20_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

/// Minutes of a visible window `[start, end)` with at least one hour in it
fn window() -> impl Strategy<Value = (u32, u32)> {
    (0u32..23).prop_flat_map(|start_hour| {
        (start_hour + 1..=24).prop_map(move |end_hour| (start_hour * 60, end_hour * 60))
    })
}

proptest! {
    /// Seven consecutive dates starting on the Monday on or before the input
    #[test]
    fn prop_week_window_days(date in any_date()) {
        let window = WeekWindow::containing(date);
        let days = window.days();

        prop_assert_eq!(days[0].weekday(), Weekday::Mon);
        prop_assert!(days[0] <= date && date <= days[6]);
        for pair in days.windows(2) {
            prop_assert_eq!(pair[0].succ_opt(), Some(pair[1]));
        }
        prop_assert_eq!(window.column_of(date), Some(date.weekday().num_days_from_monday() as usize));
        prop_assert_eq!(window.next().prev(), window);
    }

    /// Minutes survive a trip through pixels at any positive scale
    #[test]
    fn prop_time_scale_round_trip(
        (start, end) in window(),
        pixels_per_minute in 0.25f32..8.0,
        fraction in 0.0f64..=1.0,
    ) {
        let scale = TimeScale::new(start, end, pixels_per_minute).unwrap();
        let minute = start + ((end - start) as f64 * fraction) as u32;
        prop_assert_eq!(scale.y_to_minutes(scale.minutes_to_y(minute)), minute);
    }

    /// Offsets above or below the canvas clamp to the window edges
    #[test]
    fn prop_time_scale_clamps(
        (start, end) in window(),
        overshoot in 1.0f32..10_000.0,
    ) {
        let scale = TimeScale::new(start, end, 1.5).unwrap();
        prop_assert_eq!(scale.y_to_minutes(-overshoot), start);
        prop_assert_eq!(scale.y_to_minutes(scale.height() + overshoot), end);
    }

    /// Snapping lands on a step boundary no further than half a step away
    #[test]
    fn prop_snap_is_nearest_step(minute in 0u32..1440, step in prop::sample::select(vec![5u32, 10, 15, 30, 60])) {
        let snapped = snap_to_step(minute, step);
        prop_assert_eq!(snapped % step, 0);
        prop_assert!(snapped.abs_diff(minute) * 2 <= step);
    }

    /// Any create drag commits a step-aligned block of at least one step inside the window
    #[test]
    fn prop_create_gesture_is_snapped(from_y in -50.0f32..1000.0, to_y in -50.0f32..1000.0) {
        let scale = TimeScale::new(6 * 60, 22 * 60, 1.0).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let mut board = SessionBoard::new();
        let mut drag = DragController::new(30, 60);

        prop_assert!(drag.pointer_down(PointerTarget::EmptyCell, date, from_y, &scale, &board));
        drag.pointer_move(date, to_y, &scale);
        let outcome = drag.pointer_up(&mut board).unwrap();

        let GestureOutcome::Commit { request: GatewayRequest::Create(session), .. } = outcome else {
            return Err(TestCaseError::fail(format!("expected a create, got {:?}", outcome)));
        };
        prop_assert_eq!(session.start_minute % 30, 0);
        prop_assert_eq!(session.end_minute % 30, 0);
        prop_assert!(session.end_minute - session.start_minute >= 30);
        prop_assert!(session.start_minute >= 6 * 60);
        prop_assert!(session.end_minute <= 22 * 60);
        prop_assert!(!drag.is_active());
    }
}

#[test]
fn test_ten_minute_drag_snaps_to_half_hour() {
    // 1 px per minute from 06:00: 09:10 is y=190, 09:20 is y=200
    let scale = TimeScale::new(6 * 60, 22 * 60, 1.0).unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
    let mut board = SessionBoard::new();
    let mut drag = DragController::new(30, 60);

    assert!(drag.pointer_down(PointerTarget::EmptyCell, date, 190.0, &scale, &board));
    drag.pointer_move(date, 200.0, &scale);
    match drag.pointer_up(&mut board) {
        Some(GestureOutcome::Commit {
            request: GatewayRequest::Create(session),
            ..
        }) => {
            assert_eq!((session.start_minute, session.end_minute), (540, 570));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(board.blocks().len(), 1);
    assert!(board.blocks()[0].is_provisional());
}
