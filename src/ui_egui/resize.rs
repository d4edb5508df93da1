// Session resize handles
//
// Top and bottom edges of a session block act as handles that adjust the
// start and end time respectively.

use egui::{Pos2, Rect, Vec2};

use super::drag::PointerTarget;
use crate::models::session::SessionId;

/// Which edge of the block is being dragged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    /// Top edge - adjusts start time
    Top,
    /// Bottom edge - adjusts end time
    Bottom,
}

impl ResizeHandle {
    pub fn cursor_icon(&self) -> egui::CursorIcon {
        egui::CursorIcon::ResizeVertical
    }

    pub fn target(&self, id: SessionId) -> PointerTarget {
        match self {
            ResizeHandle::Top => PointerTarget::TopHandle(id),
            ResizeHandle::Bottom => PointerTarget::BottomHandle(id),
        }
    }
}

/// Visual size of the handle circle
pub const HANDLE_VISUAL_SIZE: f32 = 6.0;

/// Hit zones at the top and bottom of a block
pub struct HandleRects {
    pub top: Rect,
    pub bottom: Rect,
}

impl HandleRects {
    pub fn for_block(block_rect: Rect) -> Self {
        let height = block_rect.height();

        // Short blocks split into halves; taller ones get a fixed edge zone
        let zone_height = if height < 50.0 { height / 2.0 } else { 20.0 };

        Self {
            top: Rect::from_min_size(
                block_rect.left_top(),
                Vec2::new(block_rect.width(), zone_height),
            ),
            bottom: Rect::from_min_size(
                Pos2::new(block_rect.left(), block_rect.bottom() - zone_height),
                Vec2::new(block_rect.width(), zone_height),
            ),
        }
    }

    pub fn hit_test(&self, pos: Pos2) -> Option<ResizeHandle> {
        if self.top.contains(pos) {
            Some(ResizeHandle::Top)
        } else if self.bottom.contains(pos) {
            Some(ResizeHandle::Bottom)
        } else {
            None
        }
    }
}

/// Draw resize handles on a block
pub fn draw_handles(
    painter: &egui::Painter,
    handles: &HandleRects,
    hovered_handle: Option<ResizeHandle>,
    color: egui::Color32,
) {
    let draw_handle = |rect: Rect, handle: ResizeHandle| {
        let is_hovered = hovered_handle == Some(handle);
        let center = match handle {
            ResizeHandle::Top => Pos2::new(rect.center().x, rect.top() + HANDLE_VISUAL_SIZE / 2.0 + 2.0),
            ResizeHandle::Bottom => {
                Pos2::new(rect.center().x, rect.bottom() - HANDLE_VISUAL_SIZE / 2.0 - 2.0)
            }
        };
        let radius = if is_hovered {
            HANDLE_VISUAL_SIZE / 2.0 + 1.0
        } else {
            HANDLE_VISUAL_SIZE / 2.0
        };

        painter.circle_filled(
            center,
            radius,
            if is_hovered {
                egui::Color32::WHITE
            } else {
                egui::Color32::from_rgba_unmultiplied(
                    color.r().saturating_add(60),
                    color.g().saturating_add(60),
                    color.b().saturating_add(60),
                    color.a(),
                )
            },
        );
        painter.circle_stroke(
            center,
            radius,
            egui::Stroke::new(1.0, color.linear_multiply(0.6)),
        );
    };

    draw_handle(handles.top, ResizeHandle::Top);
    draw_handle(handles.bottom, ResizeHandle::Bottom);
}
