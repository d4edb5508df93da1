// Date utility functions
// Calendar-date arithmetic for the Monday-anchored week window

use chrono::{Datelike, Duration, Local, NaiveDate};

/// Minute-of-day as `HH:MM`; 1440 renders as `24:00`.
pub fn format_minute(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// The Monday on or before `date` (ISO weekday arithmetic).
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Seven-day window starting on a Monday.
///
/// Timezone-naive: only calendar dates are involved, so offset changes cannot
/// shift a day across the window boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekWindow {
    monday: NaiveDate,
}

impl WeekWindow {
    /// Window containing `date`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use coach_planner::utils::date::WeekWindow;
    ///
    /// // Sunday belongs to the week that started the previous Monday
    /// let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    /// let window = WeekWindow::containing(sunday);
    /// assert_eq!(window.monday(), NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    /// ```
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            monday: monday_of(date),
        }
    }

    pub fn today() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    pub fn sunday(&self) -> NaiveDate {
        self.monday + Duration::days(6)
    }

    /// New window offset by `weeks` (negative moves back).
    pub fn shift(&self, weeks: i64) -> Self {
        Self {
            monday: self.monday + Duration::days(7 * weeks),
        }
    }

    pub fn next(&self) -> Self {
        self.shift(1)
    }

    pub fn prev(&self) -> Self {
        self.shift(-1)
    }

    /// The seven dates of the window, Monday first.
    pub fn days(&self) -> [NaiveDate; 7] {
        std::array::from_fn(|i| self.monday + Duration::days(i as i64))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.monday && date <= self.sunday()
    }

    /// Column index (0 = Monday) of `date` within the window.
    pub fn column_of(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date)
            .then(|| (date - self.monday).num_days() as usize)
    }

    /// Header label such as `"3 Mar – 9 Mar 2025"`.
    pub fn label(&self) -> String {
        format!(
            "{} – {}",
            self.monday.format("%-d %b"),
            self.sunday().format("%-d %b %Y")
        )
    }
}
