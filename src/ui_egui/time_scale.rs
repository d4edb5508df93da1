//! Conversion between minutes of the day and vertical pixel offsets.

use crate::models::session::MINUTES_PER_DAY;

/// Linear mapping of the visible hours onto `[0, height]` pixels.
///
/// Offsets are relative to the top of the first visible minute; the caller
/// adds the grid's screen origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    visible_start_minute: u32,
    visible_end_minute: u32,
    pixels_per_minute: f32,
}

impl TimeScale {
    pub fn new(
        visible_start_minute: u32,
        visible_end_minute: u32,
        pixels_per_minute: f32,
    ) -> Result<Self, String> {
        if visible_end_minute > MINUTES_PER_DAY {
            return Err("Visible window cannot extend past midnight".to_string());
        }
        if visible_start_minute >= visible_end_minute {
            return Err("Visible window must start before it ends".to_string());
        }
        if !pixels_per_minute.is_finite() || pixels_per_minute <= 0.0 {
            return Err("Pixels per minute must be positive".to_string());
        }
        Ok(Self {
            visible_start_minute,
            visible_end_minute,
            pixels_per_minute,
        })
    }

    /// Scale that fits the whole visible window into `height` pixels.
    ///
    /// ```
    /// use coach_planner::ui_egui::time_scale::TimeScale;
    ///
    /// let scale = TimeScale::fit_to_height(6 * 60, 22 * 60, 960.0).unwrap();
    /// assert_eq!(scale.pixels_per_minute(), 1.0);
    /// assert_eq!(scale.minutes_to_y(9 * 60), 180.0);
    /// ```
    pub fn fit_to_height(
        visible_start_minute: u32,
        visible_end_minute: u32,
        height: f32,
    ) -> Result<Self, String> {
        let span = visible_end_minute.saturating_sub(visible_start_minute);
        if span == 0 {
            return Err("Visible window must start before it ends".to_string());
        }
        Self::new(visible_start_minute, visible_end_minute, height / span as f32)
    }

    pub fn visible_start_minute(&self) -> u32 {
        self.visible_start_minute
    }

    pub fn visible_end_minute(&self) -> u32 {
        self.visible_end_minute
    }

    pub fn pixels_per_minute(&self) -> f32 {
        self.pixels_per_minute
    }

    pub fn span_minutes(&self) -> u32 {
        self.visible_end_minute - self.visible_start_minute
    }

    pub fn height(&self) -> f32 {
        self.span_minutes() as f32 * self.pixels_per_minute
    }

    pub fn clamp_minute(&self, minute: u32) -> u32 {
        minute.clamp(self.visible_start_minute, self.visible_end_minute)
    }

    pub fn minutes_to_y(&self, minute: u32) -> f32 {
        (self.clamp_minute(minute) - self.visible_start_minute) as f32 * self.pixels_per_minute
    }

    /// Nearest whole minute for a pixel offset, clamped to the window.
    pub fn y_to_minutes(&self, y: f32) -> u32 {
        let y = if y.is_finite() { y.clamp(0.0, self.height()) } else { 0.0 };
        let offset = (y / self.pixels_per_minute).round() as u32;
        self.clamp_minute(self.visible_start_minute + offset)
    }

    /// Full hours inside the window with their offsets.
    pub fn hour_marks(&self) -> Vec<(u32, f32)> {
        let first = self.visible_start_minute.div_ceil(60) * 60;
        (first..=self.visible_end_minute)
            .step_by(60)
            .map(|minute| (minute, self.minutes_to_y(minute)))
            .collect()
    }
}
