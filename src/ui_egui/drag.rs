//! Pointer gesture state machine for creating, moving and resizing sessions.
//!
//! The controller owns at most one [`DragState`]. It is created on
//! pointer-down, updated on pointer-move and consumed on pointer-up or
//! cancel. Committing a gesture applies the change to the [`SessionBoard`]
//! optimistically and hands back the gateway request to send; the board rolls
//! the block back if that request is rejected.

use chrono::NaiveDate;

use super::time_scale::TimeScale;
use crate::models::session::{
    NewSession, SessionBlock, SessionId, SessionPatch, MINUTES_PER_DAY,
};
use crate::services::error::SchedulingError;
use crate::services::session::board::{SessionBoard, Ticket};
use crate::services::session::dispatch::GatewayRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Creating,
    Moving,
    ResizingStart,
    ResizingEnd,
}

/// What the pointer went down on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    EmptyCell,
    Body(SessionId),
    TopHandle(SessionId),
    BottomHandle(SessionId),
}

/// Uncommitted geometry drawn over the grid during a gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DraftBlock {
    pub date: NaiveDate,
    pub start_minute: u32,
    pub end_minute: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
    pub mode: DragMode,
    pub target_block_id: Option<SessionId>,
    pub anchor_y: f32,
    pub anchor_date: NaiveDate,
    pub original_start: u32,
    pub original_end: u32,
    pub draft: DraftBlock,
    moved: bool,
}

/// Result of releasing the pointer
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Nothing changed; a plain click on a block
    Unchanged { target_block_id: Option<SessionId> },
    /// Board updated optimistically; send `request` tagged with `ticket`
    Commit {
        ticket: Ticket,
        request: GatewayRequest,
    },
    /// The board refused the change before anything was sent
    Rejected(SchedulingError),
}

/// Round to the nearest multiple of `step`; ties round up.
pub fn snap_to_step(minute: u32, step: u32) -> u32 {
    if step == 0 {
        return minute;
    }
    (minute + step / 2) / step * step
}

#[derive(Debug)]
pub struct DragController {
    state: Option<DragState>,
    step_minutes: u32,
    default_session_minutes: u32,
}

impl DragController {
    pub fn new(step_minutes: u32, default_session_minutes: u32) -> Self {
        Self {
            state: None,
            step_minutes: step_minutes.max(1),
            default_session_minutes: default_session_minutes.max(step_minutes).max(1),
        }
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&DragState> {
        self.state.as_ref()
    }

    pub fn draft(&self) -> Option<DraftBlock> {
        self.state.as_ref().map(|s| s.draft)
    }

    /// Start a gesture. Ignored (returns `false`) while another gesture is
    /// active, or when the target block is unknown, still provisional or has
    /// a save in flight.
    pub fn pointer_down(
        &mut self,
        target: PointerTarget,
        date: NaiveDate,
        y: f32,
        scale: &TimeScale,
        board: &SessionBoard,
    ) -> bool {
        if self.state.is_some() {
            log::debug!("Ignoring pointer-down while a gesture is active");
            return false;
        }

        let (mode, block) = match target {
            PointerTarget::EmptyCell => (DragMode::Creating, None),
            PointerTarget::Body(id) => (DragMode::Moving, board.block(id)),
            PointerTarget::TopHandle(id) => (DragMode::ResizingStart, board.block(id)),
            PointerTarget::BottomHandle(id) => (DragMode::ResizingEnd, board.block(id)),
        };

        let state = match (mode, block) {
            (DragMode::Creating, _) => {
                let anchor = scale.y_to_minutes(y);
                let (start, end) = self.normalize(
                    DragMode::Creating,
                    anchor,
                    anchor + self.default_session_minutes,
                    scale,
                );
                DragState {
                    mode,
                    target_block_id: None,
                    anchor_y: y,
                    anchor_date: date,
                    original_start: anchor,
                    original_end: anchor,
                    draft: DraftBlock {
                        date,
                        start_minute: start,
                        end_minute: end,
                    },
                    moved: false,
                }
            }
            (_, Some(block)) if !block.is_provisional() && !board.has_pending(block.id) => {
                Self::block_state(mode, block, y)
            }
            _ => return false,
        };

        log::debug!("Gesture started: {:?} on {:?}", state.mode, state.target_block_id);
        self.state = Some(state);
        true
    }

    /// Recompute the draft for the current pointer position.
    pub fn pointer_move(&mut self, date: NaiveDate, y: f32, scale: &TimeScale) -> Option<DraftBlock> {
        let (mode, anchor_y, anchor_date, original_start, original_end) = {
            let state = self.state.as_ref()?;
            (
                state.mode,
                state.anchor_y,
                state.anchor_date,
                state.original_start,
                state.original_end,
            )
        };

        let current = scale.y_to_minutes(y) as i64;
        let delta = current - scale.y_to_minutes(anchor_y) as i64;
        let shifted = |minute: u32| (minute as i64 + delta).max(0) as u32;

        let (candidate_start, candidate_end) = match mode {
            DragMode::Creating => {
                let anchor = original_start as i64;
                (anchor.min(current) as u32, anchor.max(current) as u32)
            }
            DragMode::Moving => {
                let start = shifted(original_start);
                (start, start + (original_end - original_start))
            }
            DragMode::ResizingStart => (shifted(original_start), original_end),
            DragMode::ResizingEnd => (original_start, shifted(original_end)),
        };
        let (start, end) = self.normalize(mode, candidate_start, candidate_end, scale);

        let state = self.state.as_mut()?;
        state.moved = true;
        state.draft = DraftBlock {
            // Only a move may change the day column
            date: if mode == DragMode::Moving { date } else { anchor_date },
            start_minute: start,
            end_minute: end,
        };
        Some(state.draft)
    }

    /// Finish the gesture, applying it to the board.
    pub fn pointer_up(&mut self, board: &mut SessionBoard) -> Option<GestureOutcome> {
        let state = self.state.take()?;
        let draft = state.draft;

        let outcome = match (state.mode, state.target_block_id) {
            (DragMode::Creating, _) => {
                let request = NewSession::new(draft.date, draft.start_minute, draft.end_minute);
                match board.begin_create(&request) {
                    Ok((ticket, _)) => GestureOutcome::Commit {
                        ticket,
                        request: GatewayRequest::Create(request),
                    },
                    Err(err) => GestureOutcome::Rejected(err),
                }
            }
            (_, Some(id)) => {
                let unchanged = board.block(id).is_some_and(|b| {
                    b.date == draft.date
                        && b.start_minute == draft.start_minute
                        && b.end_minute == draft.end_minute
                });
                if !state.moved || unchanged {
                    GestureOutcome::Unchanged {
                        target_block_id: Some(id),
                    }
                } else {
                    let patch =
                        SessionPatch::times(draft.date, draft.start_minute, draft.end_minute);
                    match board.begin_update(id, &patch) {
                        Ok(ticket) => GestureOutcome::Commit {
                            ticket,
                            request: GatewayRequest::Update { id, patch },
                        },
                        Err(err) => {
                            log::warn!("Gesture on session {} dropped: {}", id, err);
                            GestureOutcome::Rejected(err)
                        }
                    }
                }
            }
            (mode, None) => {
                log::error!("{:?} gesture without a target block", mode);
                GestureOutcome::Unchanged {
                    target_block_id: None,
                }
            }
        };

        log::debug!("Gesture finished: {:?}", outcome);
        Some(outcome)
    }

    /// Abandon the gesture without touching the board (pointer left the
    /// window, focus lost, escape).
    pub fn cancel(&mut self) -> Option<DragState> {
        let state = self.state.take();
        if state.is_some() {
            log::debug!("Gesture cancelled");
        }
        state
    }

    fn block_state(mode: DragMode, block: &SessionBlock, y: f32) -> DragState {
        DragState {
            mode,
            target_block_id: Some(block.id),
            anchor_y: y,
            anchor_date: block.date,
            original_start: block.start_minute,
            original_end: block.end_minute,
            draft: DraftBlock {
                date: block.date,
                start_minute: block.start_minute,
                end_minute: block.end_minute,
            },
            moved: false,
        }
    }

    /// Snap pointer-driven endpoints to the step grid and keep at least one
    /// step. A move snaps its start, keeps the block's length and stays inside
    /// the visible window. A resize only snaps and clamps the handle being
    /// dragged; the other endpoint keeps its saved value even when it lies
    /// outside the window.
    fn normalize(&self, mode: DragMode, start: u32, end: u32, scale: &TimeScale) -> (u32, u32) {
        let step = self.step_minutes;
        let low = scale.visible_start_minute();
        let high = scale.visible_end_minute();
        let min_len = step.min(high - low);
        let driven = |minute: u32| snap_to_step(minute, step).clamp(low, high);

        match mode {
            DragMode::Moving => {
                let length = end.saturating_sub(start).max(min_len).min(high - low);
                let start = snap_to_step(start, step).clamp(low, high - length);
                (start, start + length)
            }
            DragMode::ResizingStart => {
                let start = driven(start).min(end.saturating_sub(min_len));
                (start, end)
            }
            DragMode::ResizingEnd => {
                let end = driven(end).max(start + min_len).min(MINUTES_PER_DAY);
                (start, end)
            }
            DragMode::Creating => {
                let mut start = driven(start);
                let mut end = driven(end);
                if end < start + min_len {
                    end = start + min_len;
                    if end > high {
                        end = high;
                        start = high - min_len;
                    }
                }
                (start, end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::error::SchedulingError;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    /// 06:00-22:00 at one pixel per minute, so y = minute - 360.
    fn scale() -> TimeScale {
        TimeScale::new(360, 1320, 1.0).unwrap()
    }

    fn y(minute: u32) -> f32 {
        scale().minutes_to_y(minute)
    }

    fn board() -> SessionBoard {
        let mut board = SessionBoard::new();
        board.load(vec![
            SessionBlock::new(1, monday(), 540, 600, "Strength").unwrap(),
            SessionBlock::new(2, monday(), 660, 720, "Mobility").unwrap(),
        ]);
        board
    }

    #[test_case(550, 30, 540 ; "rounds down")]
    #[test_case(560, 30, 570 ; "rounds up")]
    #[test_case(555, 30, 570 ; "tie rounds up")]
    #[test_case(541, 15, 540 ; "quarter hours")]
    #[test_case(541, 0, 541 ; "zero step")]
    fn test_snap_to_step(minute: u32, step: u32, expected: u32) {
        assert_eq!(snap_to_step(minute, step), expected);
    }

    #[test]
    fn test_create_drag_snaps_to_enclosing_step() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);

        assert!(drag.pointer_down(PointerTarget::EmptyCell, monday(), y(550), &scale, &board));
        let draft = drag.pointer_move(monday(), y(560), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (540, 570));

        match drag.pointer_up(&mut board).unwrap() {
            GestureOutcome::Commit {
                request: GatewayRequest::Create(request),
                ..
            } => {
                assert_eq!((request.start_minute, request.end_minute), (540, 570));
                assert_eq!(request.date, monday());
            }
            other => panic!("expected create commit, got {:?}", other),
        }
        assert!(!drag.is_active());
        assert_eq!(board.blocks().len(), 3);
    }

    #[test]
    fn test_tiny_create_drag_keeps_one_step() {
        let scale = scale();
        let board = board();
        let mut drag = DragController::new(30, 60);
        drag.pointer_down(PointerTarget::EmptyCell, monday(), y(541), &scale, &board);
        let draft = drag.pointer_move(monday(), y(543), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (540, 570));
    }

    #[test]
    fn test_upward_create_drag_and_window_end() {
        let scale = scale();
        let board = board();
        let mut drag = DragController::new(30, 60);
        drag.pointer_down(PointerTarget::EmptyCell, monday(), y(1319), &scale, &board);
        let draft = drag.pointer_move(monday(), y(1310), &scale).unwrap();
        // Both snap to 22:00; the start is pulled back to keep one step
        assert_eq!((draft.start_minute, draft.end_minute), (1290, 1320));

        let draft = drag.pointer_move(monday(), y(1200), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (1200, 1320));
    }

    #[test]
    fn test_click_on_empty_cell_uses_default_length() {
        let scale = scale();
        let board = board();
        let mut drag = DragController::new(30, 90);
        drag.pointer_down(PointerTarget::EmptyCell, tuesday(), y(605), &scale, &board);
        let draft = drag.draft().unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (600, 690));
        assert_eq!(draft.date, tuesday());
    }

    #[test]
    fn test_single_active_gesture() {
        let scale = scale();
        let board = board();
        let mut drag = DragController::new(30, 60);
        assert!(drag.pointer_down(PointerTarget::Body(1), monday(), y(560), &scale, &board));
        assert!(!drag.pointer_down(PointerTarget::EmptyCell, monday(), y(900), &scale, &board));
        assert_eq!(drag.state().unwrap().mode, DragMode::Moving);
    }

    #[test]
    fn test_unknown_or_provisional_target_is_ignored() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);
        assert!(!drag.pointer_down(PointerTarget::Body(99), monday(), y(560), &scale, &board));

        let (_, provisional) = board
            .begin_create(&NewSession::new(monday(), 900, 960))
            .unwrap();
        assert!(!drag.pointer_down(
            PointerTarget::Body(provisional.id),
            monday(),
            y(910),
            &scale,
            &board
        ));
        assert!(!drag.is_active());
    }

    #[test]
    fn test_move_keeps_duration_and_can_change_day() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);
        drag.pointer_down(PointerTarget::Body(1), monday(), y(560), &scale, &board);
        let draft = drag.pointer_move(tuesday(), y(628), &scale).unwrap();
        // +68 minutes snaps the start from 10:08 to 10:00
        assert_eq!(
            draft,
            DraftBlock {
                date: tuesday(),
                start_minute: 600,
                end_minute: 660
            }
        );

        let outcome = drag.pointer_up(&mut board).unwrap();
        let GestureOutcome::Commit { request, .. } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(
            request,
            GatewayRequest::Update {
                id: 1,
                patch: SessionPatch::times(tuesday(), 600, 660)
            }
        );
        assert_eq!(board.block(1).unwrap().date, tuesday());
    }

    #[test]
    fn test_move_is_clamped_to_window() {
        let scale = scale();
        let board = board();
        let mut drag = DragController::new(30, 60);
        drag.pointer_down(PointerTarget::Body(1), monday(), y(560), &scale, &board);
        let draft = drag.pointer_move(monday(), y(1320), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (1260, 1320));
        let draft = drag.pointer_move(monday(), y(0), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (360, 420));
    }

    #[test]
    fn test_resize_start_and_end() {
        let scale = scale();
        let board = board();
        let mut drag = DragController::new(30, 60);

        drag.pointer_down(PointerTarget::TopHandle(1), monday(), y(540), &scale, &board);
        let draft = drag.pointer_move(monday(), y(480), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (480, 600));
        // Pushing the top past the bottom leaves one step
        let draft = drag.pointer_move(monday(), y(700), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (570, 600));
        drag.cancel();

        drag.pointer_down(PointerTarget::BottomHandle(1), monday(), y(600), &scale, &board);
        let draft = drag.pointer_move(monday(), y(652), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (540, 660));
        let draft = drag.pointer_move(monday(), y(400), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (540, 570));
        // Resizing never changes the column
        let draft = drag.pointer_move(tuesday(), y(640), &scale).unwrap();
        assert_eq!(draft.date, monday());
    }

    #[test]
    fn test_click_on_block_without_move_is_unchanged() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);
        drag.pointer_down(PointerTarget::Body(2), monday(), y(670), &scale, &board);
        assert_eq!(
            drag.pointer_up(&mut board),
            Some(GestureOutcome::Unchanged {
                target_block_id: Some(2)
            })
        );
        assert_eq!(board.pending_count(), 0);
    }

    #[test]
    fn test_rejected_update_rolls_back_block() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);
        let before = board.block(1).cloned().unwrap();

        drag.pointer_down(PointerTarget::Body(1), monday(), y(560), &scale, &board);
        drag.pointer_move(monday(), y(800), &scale);
        let Some(GestureOutcome::Commit { ticket, .. }) = drag.pointer_up(&mut board) else {
            panic!("expected commit");
        };
        assert_ne!(board.block(1).unwrap().start_minute, before.start_minute);

        board.resolve_saved(
            ticket,
            Err(SchedulingError::Conflict {
                reason: "Slot already booked".to_string(),
            }),
        );
        let after = board.block(1).unwrap();
        assert_eq!((after.start_minute, after.end_minute), (before.start_minute, before.end_minute));
        assert!(!drag.is_active());
    }

    #[test]
    fn test_cancel_leaves_board_untouched() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);
        drag.pointer_down(PointerTarget::Body(1), monday(), y(560), &scale, &board);
        drag.pointer_move(monday(), y(800), &scale);
        assert!(drag.cancel().is_some());
        assert!(drag.pointer_up(&mut board).is_none());
        assert_eq!(board.block(1).unwrap().start_minute, 540);
        assert!(drag.cancel().is_none());
    }

    #[test]
    fn test_move_of_block_gone_after_navigation_is_rejected() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);
        drag.pointer_down(PointerTarget::Body(1), monday(), y(560), &scale, &board);
        drag.pointer_move(monday(), y(700), &scale);
        board.invalidate();
        assert!(matches!(
            drag.pointer_up(&mut board),
            Some(GestureOutcome::Rejected(SchedulingError::Validation(_)))
        ));
    }

    #[test]
    fn test_resize_end_keeps_start_above_window() {
        let scale = scale();
        let mut board = SessionBoard::new();
        board.load(vec![SessionBlock::new(7, monday(), 330, 420, "Early swim").unwrap()]);
        let mut drag = DragController::new(30, 60);

        assert!(drag.pointer_down(PointerTarget::BottomHandle(7), monday(), y(420), &scale, &board));
        let draft = drag.pointer_move(monday(), y(450), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (330, 450));
        // Dragging the end above the window stops one step after the start
        let draft = drag.pointer_move(monday(), y(0), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (330, 360));

        drag.pointer_move(monday(), y(450), &scale);
        let Some(GestureOutcome::Commit { request, .. }) = drag.pointer_up(&mut board) else {
            panic!("expected commit");
        };
        assert_eq!(
            request,
            GatewayRequest::Update {
                id: 7,
                patch: SessionPatch::times(monday(), 330, 450)
            }
        );
    }

    #[test]
    fn test_resize_start_keeps_end_below_window() {
        let scale = scale();
        let mut board = SessionBoard::new();
        board.load(vec![SessionBlock::new(8, monday(), 1260, 1380, "Late run").unwrap()]);
        let mut drag = DragController::new(30, 60);

        drag.pointer_down(PointerTarget::TopHandle(8), monday(), y(1260), &scale, &board);
        let draft = drag.pointer_move(monday(), y(1200), &scale).unwrap();
        assert_eq!((draft.start_minute, draft.end_minute), (1200, 1380));
    }

    #[test]
    fn test_block_with_save_in_flight_cannot_be_grabbed() {
        let scale = scale();
        let mut board = board();
        let mut drag = DragController::new(30, 60);

        drag.pointer_down(PointerTarget::Body(1), monday(), y(560), &scale, &board);
        drag.pointer_move(monday(), y(620), &scale);
        let Some(GestureOutcome::Commit { ticket, .. }) = drag.pointer_up(&mut board) else {
            panic!("expected commit");
        };

        assert!(!drag.pointer_down(PointerTarget::Body(1), monday(), y(620), &scale, &board));
        assert!(!drag.pointer_down(PointerTarget::BottomHandle(1), monday(), y(660), &scale, &board));
        assert!(drag.pointer_down(PointerTarget::Body(2), monday(), y(670), &scale, &board));
        drag.cancel();

        board.resolve_saved(ticket, Ok(SessionBlock::new(1, monday(), 600, 660, "Strength").unwrap()));
        assert!(drag.pointer_down(PointerTarget::Body(1), monday(), y(620), &scale, &board));
    }
}
