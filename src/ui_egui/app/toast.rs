//! Short-lived notices for gateway outcomes.
//!
//! Rejected edits roll back on the grid silently; the toast is what tells the
//! coach why the block jumped back.

use egui::{Color32, Context, Pos2, RichText};
use std::time::{Duration, Instant};

use crate::services::error::SchedulingError;
use crate::services::session::board::Resolution;

const TOAST_WIDTH: f32 = 320.0;
const TOAST_HEIGHT: f32 = 40.0;
const MARGIN: f32 = 10.0;
const SPACING: f32 = 5.0;
const FADE: Duration = Duration::from_millis(500);
const MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastLevel::Success => "✓",
            ToastLevel::Info => "ℹ",
            ToastLevel::Warning => "⚠",
            ToastLevel::Error => "✗",
        }
    }

    /// (background, text) for the current theme
    fn colors(&self, dark: bool) -> (Color32, Color32) {
        match (self, dark) {
            (ToastLevel::Success, true) => (Color32::from_rgb(30, 70, 40), Color32::from_rgb(100, 220, 120)),
            (ToastLevel::Info, true) => (Color32::from_rgb(30, 50, 80), Color32::from_rgb(100, 180, 255)),
            (ToastLevel::Warning, true) => (Color32::from_rgb(80, 60, 20), Color32::from_rgb(255, 200, 80)),
            (ToastLevel::Error, true) => (Color32::from_rgb(80, 30, 30), Color32::from_rgb(255, 120, 120)),
            (ToastLevel::Success, false) => (Color32::from_rgb(220, 255, 220), Color32::from_rgb(30, 120, 50)),
            (ToastLevel::Info, false) => (Color32::from_rgb(220, 235, 255), Color32::from_rgb(30, 80, 150)),
            (ToastLevel::Warning, false) => (Color32::from_rgb(255, 245, 200), Color32::from_rgb(150, 100, 0)),
            (ToastLevel::Error, false) => (Color32::from_rgb(255, 220, 220), Color32::from_rgb(180, 40, 40)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    created_at: Instant,
    duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, level: ToastLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration: Duration::from_secs(3),
        }
    }

    /// Input problems are warnings; server and conflict failures are errors
    /// and stay up a little longer.
    pub fn from_error(context: &str, error: &SchedulingError) -> Self {
        let message = format!("{}: {}", context, error);
        if error.is_recoverable_locally() {
            Self::new(message, ToastLevel::Warning)
        } else {
            Self::new(message, ToastLevel::Error).with_duration(Duration::from_secs(5))
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }

    /// 1.0 until the last half second, then a linear fade.
    pub fn opacity(&self) -> f32 {
        let elapsed = self.created_at.elapsed();
        if elapsed >= self.duration {
            return 0.0;
        }
        let remaining = self.duration - elapsed;
        if remaining < FADE {
            (remaining.as_secs_f32() / FADE.as_secs_f32()).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: Vec<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, toast: Toast) {
        self.toasts.push(toast);
        if self.toasts.len() > MAX_VISIBLE {
            self.toasts.remove(0);
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.add(Toast::new(message, ToastLevel::Success));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Toast::new(message, ToastLevel::Info));
    }

    pub fn error(&mut self, context: &str, error: &SchedulingError) {
        self.add(Toast::from_error(context, error));
    }

    /// Announce what a gateway answer did to the grid.
    pub fn resolution(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::RolledBack { error, .. } => self.error("Change undone", error),
            Resolution::LoadFailed(error) => self.error("Could not load the week", error),
            Resolution::Removed(_) => self.info("Session deleted"),
            Resolution::Confirmed(_) | Resolution::Loaded(_) | Resolution::Stale => {}
        }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn cleanup(&mut self) {
        self.toasts.retain(|t| !t.is_expired());
    }

    /// Stack toasts upward from the bottom-right corner.
    pub fn render(&mut self, ctx: &Context) {
        self.cleanup();
        if self.toasts.is_empty() {
            return;
        }
        ctx.request_repaint();

        let dark = ctx.style().visuals.dark_mode;
        let screen_rect = ctx.screen_rect();

        for (i, toast) in self.toasts.iter().rev().enumerate() {
            let opacity = toast.opacity();
            if opacity <= 0.0 {
                continue;
            }
            let pos = Pos2::new(
                screen_rect.right() - TOAST_WIDTH - MARGIN,
                screen_rect.bottom() - TOAST_HEIGHT - MARGIN - i as f32 * (TOAST_HEIGHT + SPACING),
            );

            let (bg, fg) = toast.level.colors(dark);
            let bg = bg.gamma_multiply(0.9 * opacity);
            let fg = fg.gamma_multiply(opacity);

            egui::Area::new(egui::Id::new(("toast", i)))
                .fixed_pos(pos)
                .order(egui::Order::Foreground)
                .interactable(false)
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(bg)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                        .stroke(egui::Stroke::new(1.0, fg.gamma_multiply(0.3)))
                        .show(ui, |ui| {
                            ui.set_min_width(TOAST_WIDTH - 24.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(toast.level.icon()).color(fg).strong());
                                ui.label(RichText::new(&toast.message).color(fg));
                            });
                        });
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_follow_error_kind() {
        let toast = Toast::from_error("Move", &SchedulingError::Validation("bad".into()));
        assert_eq!(toast.level, ToastLevel::Warning);
        assert_eq!(toast.message, "Move: invalid input: bad");

        let toast = Toast::from_error(
            "Move",
            &SchedulingError::Conflict {
                reason: "taken".into(),
            },
        );
        assert_eq!(toast.level, ToastLevel::Error);
    }

    #[test]
    fn test_resolutions_that_need_no_notice() {
        let mut toasts = ToastManager::new();
        toasts.resolution(&Resolution::Confirmed(3));
        toasts.resolution(&Resolution::Loaded(4));
        toasts.resolution(&Resolution::Stale);
        assert!(toasts.toasts().is_empty());

        toasts.resolution(&Resolution::RolledBack {
            block_id: 3,
            error: SchedulingError::Network("offline".into()),
        });
        assert_eq!(toasts.toasts().len(), 1);
        assert_eq!(toasts.toasts()[0].level, ToastLevel::Error);
    }

    #[test]
    fn test_oldest_toast_dropped_past_limit() {
        let mut toasts = ToastManager::new();
        for i in 0..MAX_VISIBLE + 2 {
            toasts.info(format!("notice {}", i));
        }
        assert_eq!(toasts.toasts().len(), MAX_VISIBLE);
        assert_eq!(toasts.toasts()[0].message, "notice 2");
    }

    #[test]
    fn test_expired_toast_is_transparent() {
        let toast = Toast::new("x", ToastLevel::Info).with_duration(Duration::ZERO);
        assert!(toast.is_expired());
        assert_eq!(toast.opacity(), 0.0);
        assert_eq!(Toast::new("y", ToastLevel::Info).opacity(), 1.0);
    }
}
