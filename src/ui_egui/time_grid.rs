//! Weekly time grid: seven day columns, hour gridlines, session blocks and
//! the pointer routing that drives [`DragController`].
//!
//! Geometry lives in [`GridGeometry`] so hit-testing and layout can be
//! exercised without a running UI; [`TimeGridCanvas::show`] only paints and
//! translates egui input into [`PointerEvent`]s.

use chrono::{Local, NaiveDate, Timelike};
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

use super::drag::{DragController, DraftBlock, GestureOutcome, PointerTarget};
use super::resize::{draw_handles, HandleRects};
use super::time_scale::TimeScale;
use crate::models::session::{SessionBlock, SessionId};
use crate::models::settings::GridSettings;
use crate::services::error::SchedulingError;
use crate::services::palette::ColorAssigner;
use crate::services::session::board::{SessionBoard, Ticket};
use crate::services::session::dispatch::GatewayRequest;
use crate::utils::date::{format_minute, WeekWindow};

pub const TIME_LABEL_WIDTH: f32 = 52.0;
pub const HEADER_HEIGHT: f32 = 28.0;
pub const COLUMN_SPACING: f32 = 2.0;

/// Parse a `#RRGGBB` colour.
pub fn parse_color(hex: &str) -> Option<Color32> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Color32::from_rgb(r, g, b))
}

pub fn block_color(block: &SessionBlock) -> Color32 {
    let hex = ColorAssigner::block_color(block.status, block.pattern.as_ref().map(|p| p.weekdays()));
    parse_color(hex).unwrap_or(Color32::from_rgb(100, 160, 200))
}

/// Screen layout of one frame of the grid.
#[derive(Debug, Clone, Copy)]
pub struct GridGeometry {
    pub rect: Rect,
    pub week: WeekWindow,
    pub scale: TimeScale,
}

impl GridGeometry {
    pub fn new(
        rect: Rect,
        week: WeekWindow,
        visible_start_minute: u32,
        visible_end_minute: u32,
    ) -> Result<Self, String> {
        let body_height = rect.height() - HEADER_HEIGHT;
        if body_height <= 0.0 {
            return Err("Grid is too small to draw".to_string());
        }
        let scale = TimeScale::fit_to_height(visible_start_minute, visible_end_minute, body_height)?;
        Ok(Self { rect, week, scale })
    }

    pub fn body_top(&self) -> f32 {
        self.rect.top() + HEADER_HEIGHT
    }

    fn columns_left(&self) -> f32 {
        self.rect.left() + TIME_LABEL_WIDTH
    }

    pub fn column_width(&self) -> f32 {
        let available = self.rect.width() - TIME_LABEL_WIDTH - 6.0 * COLUMN_SPACING;
        (available / 7.0).max(1.0)
    }

    pub fn column_rect(&self, column: usize) -> Rect {
        let left = self.columns_left() + column as f32 * (self.column_width() + COLUMN_SPACING);
        Rect::from_min_size(
            Pos2::new(left, self.body_top()),
            Vec2::new(self.column_width(), self.scale.height()),
        )
    }

    /// Column under `x`; the gap after a column belongs to it.
    pub fn column_at(&self, x: f32) -> Option<usize> {
        let offset = x - self.columns_left();
        if offset < 0.0 {
            return None;
        }
        let column = (offset / (self.column_width() + COLUMN_SPACING)) as usize;
        (column < 7).then_some(column)
    }

    /// Column under `x`, clamped to the week so drags can leave the grid.
    pub fn nearest_column(&self, x: f32) -> usize {
        self.column_at(x)
            .unwrap_or(if x < self.columns_left() { 0 } else { 6 })
    }

    pub fn y_offset(&self, pos: Pos2) -> f32 {
        pos.y - self.body_top()
    }

    pub fn in_body(&self, pos: Pos2) -> bool {
        pos.y >= self.body_top()
            && pos.y <= self.body_top() + self.scale.height()
            && self.column_at(pos.x).is_some()
    }

    pub fn block_rect(&self, date: NaiveDate, start_minute: u32, end_minute: u32) -> Option<Rect> {
        let column = self.week.column_of(date)?;
        if end_minute <= self.scale.visible_start_minute()
            || start_minute >= self.scale.visible_end_minute()
        {
            return None;
        }
        let column_rect = self.column_rect(column);
        let top = self.body_top() + self.scale.minutes_to_y(start_minute);
        let bottom = self.body_top() + self.scale.minutes_to_y(end_minute);
        Some(Rect::from_min_max(
            Pos2::new(column_rect.left() + 1.0, top),
            Pos2::new(column_rect.right() - 1.0, bottom.max(top + 2.0)),
        ))
    }

    /// What a pointer-down at `pos` would grab. Later blocks are drawn on
    /// top, so they are tested first.
    pub fn hit_test(&self, pos: Pos2, board: &SessionBoard) -> Option<PointerTarget> {
        if !self.in_body(pos) {
            return None;
        }
        let date = self.week.days()[self.column_at(pos.x)?];
        let hit = board
            .blocks_on(date)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find_map(|block| {
                let rect = self.block_rect(block.date, block.start_minute, block.end_minute)?;
                if !rect.contains(pos) {
                    return None;
                }
                Some(match HandleRects::for_block(rect).hit_test(pos) {
                    Some(handle) => handle.target(block.id),
                    None => PointerTarget::Body(block.id),
                })
            });
        Some(hit.unwrap_or(PointerTarget::EmptyCell))
    }
}

/// Pointer input routed to the grid, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up,
    Cancel,
}

/// Something the app has to act on after a frame
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasAction {
    /// A committed block was clicked; open its detail panel
    Select(SessionId),
    /// Send the request; the board already shows the change
    Commit {
        ticket: Ticket,
        request: GatewayRequest,
    },
    Rejected(SchedulingError),
}

pub struct TimeGridCanvas {
    week: WeekWindow,
    visible_start_minute: u32,
    visible_end_minute: u32,
    drag: DragController,
    selected: Option<SessionId>,
}

impl TimeGridCanvas {
    pub fn new(week: WeekWindow, grid: &GridSettings) -> Self {
        Self {
            week,
            visible_start_minute: grid.visible_start_hour * 60,
            visible_end_minute: grid.visible_end_hour * 60,
            drag: DragController::new(grid.step_minutes, grid.default_session_minutes),
            selected: None,
        }
    }

    pub fn week(&self) -> WeekWindow {
        self.week
    }

    pub fn selected(&self) -> Option<SessionId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<SessionId>) {
        self.selected = id;
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Move the window by `weeks`. Pending requests for the old week are
    /// invalidated; an active gesture is kept.
    pub fn navigate(&mut self, weeks: i64, board: &mut SessionBoard) -> WeekWindow {
        self.set_week(self.week.shift(weeks), board)
    }

    pub fn set_week(&mut self, week: WeekWindow, board: &mut SessionBoard) -> WeekWindow {
        if week != self.week {
            self.week = week;
            self.selected = None;
            board.invalidate();
            log::info!("Showing week {}", week.label());
        }
        self.week
    }

    pub fn geometry(&self, rect: Rect) -> Result<GridGeometry, String> {
        GridGeometry::new(rect, self.week, self.visible_start_minute, self.visible_end_minute)
    }

    pub fn handle_pointer(
        &mut self,
        geometry: &GridGeometry,
        event: PointerEvent,
        board: &mut SessionBoard,
    ) -> Option<CanvasAction> {
        match event {
            PointerEvent::Down(pos) => {
                let target = geometry.hit_test(pos, board)?;
                let date = geometry.week.days()[geometry.nearest_column(pos.x)];
                self.drag
                    .pointer_down(target, date, geometry.y_offset(pos), &geometry.scale, board);
                None
            }
            PointerEvent::Move(pos) => {
                let date = geometry.week.days()[geometry.nearest_column(pos.x)];
                self.drag
                    .pointer_move(date, geometry.y_offset(pos), &geometry.scale);
                None
            }
            PointerEvent::Up => match self.drag.pointer_up(board)? {
                GestureOutcome::Unchanged {
                    target_block_id: Some(id),
                } => {
                    self.selected = Some(id);
                    Some(CanvasAction::Select(id))
                }
                GestureOutcome::Unchanged {
                    target_block_id: None,
                } => None,
                GestureOutcome::Commit { ticket, request } => {
                    Some(CanvasAction::Commit { ticket, request })
                }
                GestureOutcome::Rejected(err) => Some(CanvasAction::Rejected(err)),
            },
            PointerEvent::Cancel => {
                self.drag.cancel();
                None
            }
        }
    }

    /// Paint the grid and route this frame's pointer input.
    pub fn show(&mut self, ui: &mut egui::Ui, board: &mut SessionBoard) -> Vec<CanvasAction> {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let geometry = match self.geometry(rect) {
            Ok(geometry) => geometry,
            Err(_) => return Vec::new(),
        };

        let mut actions = Vec::new();
        for event in self.collect_pointer_events(ui, &response) {
            actions.extend(self.handle_pointer(&geometry, event, board));
        }

        let painter = ui.painter_at(rect);
        self.paint_background(ui, &painter, &geometry);
        self.paint_blocks(ui, &painter, &geometry, board);
        draw_current_time_indicator(&painter, &geometry);

        if self.drag.is_active() {
            ui.ctx().request_repaint();
        }
        actions
    }

    fn collect_pointer_events(&self, ui: &egui::Ui, response: &egui::Response) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        let (focused, escape, released, latest, origin) = ui.input(|i| {
            (
                i.focused,
                i.key_pressed(egui::Key::Escape),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
                i.pointer.press_origin(),
            )
        });

        if self.drag.is_active() && (!focused || escape) {
            events.push(PointerEvent::Cancel);
            return events;
        }

        if response.drag_started() {
            if let Some(pos) = origin.or(response.interact_pointer_pos()) {
                events.push(PointerEvent::Down(pos));
            }
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(PointerEvent::Down(pos));
                events.push(PointerEvent::Up);
            }
            return events;
        }

        if self.drag.is_active() || response.drag_started() {
            if let Some(pos) = latest {
                events.push(PointerEvent::Move(pos));
            }
            if response.drag_stopped() || released {
                events.push(PointerEvent::Up);
            }
        }
        events
    }

    fn paint_background(&self, ui: &egui::Ui, painter: &egui::Painter, geometry: &GridGeometry) {
        let visuals = ui.visuals();
        let line_color = visuals.widgets.noninteractive.bg_stroke.color;
        let text_color = visuals.weak_text_color();
        let today = Local::now().date_naive();

        for (column, date) in geometry.week.days().iter().enumerate() {
            let column_rect = geometry.column_rect(column);
            let fill = if *date == today {
                visuals.selection.bg_fill.gamma_multiply(0.15)
            } else {
                visuals.extreme_bg_color
            };
            painter.rect_filled(column_rect, 0.0, fill);
            painter.text(
                Pos2::new(column_rect.center().x, geometry.rect.top() + HEADER_HEIGHT / 2.0),
                egui::Align2::CENTER_CENTER,
                date.format("%a %-d").to_string(),
                egui::FontId::proportional(13.0),
                if *date == today {
                    visuals.strong_text_color()
                } else {
                    visuals.text_color()
                },
            );
        }

        let left = geometry.rect.left() + TIME_LABEL_WIDTH;
        let right = geometry.rect.right();
        for (minute, y) in geometry.scale.hour_marks() {
            let y = geometry.body_top() + y;
            painter.line_segment(
                [Pos2::new(left, y), Pos2::new(right, y)],
                Stroke::new(1.0, line_color),
            );
            painter.text(
                Pos2::new(left - 6.0, y),
                egui::Align2::RIGHT_CENTER,
                format_minute(minute),
                egui::FontId::proportional(11.0),
                text_color,
            );
        }
    }

    fn paint_blocks(
        &self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        geometry: &GridGeometry,
        board: &SessionBoard,
    ) {
        let dragging = self.drag.state().and_then(|s| s.target_block_id);
        let hover = ui.input(|i| i.pointer.hover_pos());

        for date in geometry.week.days() {
            for block in board.blocks_on(date) {
                if Some(block.id) == dragging {
                    continue;
                }
                let Some(rect) = geometry.block_rect(block.date, block.start_minute, block.end_minute)
                else {
                    continue;
                };
                let busy = block.is_provisional() || board.has_pending(block.id);
                let mut color = block_color(block);
                if busy {
                    color = color.gamma_multiply(0.6);
                }
                painter.rect_filled(rect, 4.0, color);
                if self.selected == Some(block.id) {
                    painter.rect_stroke(rect, 4.0, Stroke::new(2.0, ui.visuals().strong_text_color()));
                }
                paint_label(painter, rect, &block.title, block.start_minute, block.end_minute);

                let hovered = hover.filter(|p| rect.contains(*p));
                if let (Some(pos), false) = (hovered, self.drag.is_active() || busy) {
                    let handles = HandleRects::for_block(rect);
                    let hovered_handle = handles.hit_test(pos);
                    draw_handles(painter, &handles, hovered_handle, color);
                    if let Some(handle) = hovered_handle {
                        ui.ctx().set_cursor_icon(handle.cursor_icon());
                    }
                }
            }
        }

        if let Some(draft) = self.drag.draft() {
            self.paint_draft(ui, painter, geometry, board, draft);
        }
    }

    fn paint_draft(
        &self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        geometry: &GridGeometry,
        board: &SessionBoard,
        draft: DraftBlock,
    ) {
        let Some(rect) = geometry.block_rect(draft.date, draft.start_minute, draft.end_minute) else {
            return;
        };
        let target = self.drag.state().and_then(|s| s.target_block_id);
        let base = target
            .and_then(|id| board.block(id))
            .map(block_color)
            .unwrap_or(ui.visuals().selection.bg_fill);
        let title = target
            .and_then(|id| board.block(id))
            .map(|b| b.title.clone())
            .unwrap_or_else(|| "New session".to_string());

        painter.rect_filled(rect, 4.0, base.gamma_multiply(0.7));
        painter.rect_stroke(rect, 4.0, Stroke::new(1.5, Color32::WHITE));
        paint_label(painter, rect, &title, draft.start_minute, draft.end_minute);
    }
}

fn paint_label(painter: &egui::Painter, rect: Rect, title: &str, start: u32, end: u32) {
    let text = if rect.height() >= 32.0 {
        format!("{}\n{}–{}", title, format_minute(start), format_minute(end))
    } else {
        format!("{} {}", format_minute(start), title)
    };
    let galley = painter.layout(
        text,
        egui::FontId::proportional(11.0),
        Color32::WHITE,
        (rect.width() - 6.0).max(1.0),
    );
    painter
        .with_clip_rect(rect)
        .galley(rect.left_top() + Vec2::new(3.0, 2.0), galley, Color32::WHITE);
}

/// Red line across today's column at the current time.
fn draw_current_time_indicator(painter: &egui::Painter, geometry: &GridGeometry) {
    let now = Local::now();
    let Some(column) = geometry.week.column_of(now.date_naive()) else {
        return;
    };
    let minute = now.time().hour() * 60 + now.time().minute();
    if minute < geometry.scale.visible_start_minute() || minute > geometry.scale.visible_end_minute() {
        return;
    }

    let column_rect = geometry.column_rect(column);
    let y = geometry.body_top() + geometry.scale.minutes_to_y(minute);
    let line_color = Color32::from_rgb(255, 100, 100);
    painter.circle_filled(Pos2::new(column_rect.left() - 4.0, y), 3.0, line_color);
    painter.line_segment(
        [Pos2::new(column_rect.left(), y), Pos2::new(column_rect.right(), y)],
        Stroke::new(2.0, line_color),
    );
}
