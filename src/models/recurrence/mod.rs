// Recurrence module
// Weekday pattern groups and the ScheduleSpec expanded by the sequencer

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::session::MINUTES_PER_DAY;

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Separator used when a pattern is rendered as a canonical key.
pub const PATTERN_KEY_SEPARATOR: char = ',';

/// Weekday index of a date in the 0 = Sunday .. 6 = Saturday domain.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// A set of weekdays on which sessions repeat.
///
/// Always stored sorted ascending and de-duplicated, so two patterns built from
/// the same days in a different order compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct RecurrencePattern {
    weekdays: Vec<u8>,
}

impl RecurrencePattern {
    /// Build a pattern from weekday indices (0 = Sunday).
    ///
    /// # Examples
    /// ```
    /// use coach_planner::models::recurrence::RecurrencePattern;
    ///
    /// let pattern = RecurrencePattern::new([5, 1, 3, 1]).unwrap();
    /// assert_eq!(pattern.weekdays(), &[1, 3, 5]);
    /// assert_eq!(pattern.key(), "1,3,5");
    /// ```
    pub fn new(days: impl IntoIterator<Item = u8>) -> Result<Self, String> {
        let mut weekdays: Vec<u8> = days.into_iter().collect();
        if let Some(bad) = weekdays.iter().find(|d| **d > 6) {
            return Err(format!("Weekday index {} is outside 0..=6", bad));
        }
        weekdays.sort_unstable();
        weekdays.dedup();
        if weekdays.is_empty() {
            return Err("Recurrence pattern must contain at least one weekday".to_string());
        }
        Ok(Self { weekdays })
    }

    /// Parse a canonical key such as `"1,3,5"`.
    pub fn from_key(key: &str) -> Result<Self, String> {
        let days = key
            .split(PATTERN_KEY_SEPARATOR)
            .map(|part| {
                part.trim()
                    .parse::<u8>()
                    .map_err(|_| format!("Invalid weekday '{}' in pattern key", part))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(days)
    }

    pub fn weekdays(&self) -> &[u8] {
        &self.weekdays
    }

    pub fn contains(&self, weekday: u8) -> bool {
        self.weekdays.binary_search(&weekday).is_ok()
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.contains(weekday_index(date))
    }

    /// Canonical key, e.g. `"1,3,5"`.
    pub fn key(&self) -> String {
        canonical_key(&self.weekdays)
    }

    /// Human label, e.g. `"Mon/Wed/Fri"`.
    pub fn label(&self) -> String {
        self.weekdays
            .iter()
            .map(|d| WEEKDAY_LABELS[*d as usize])
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl TryFrom<Vec<u8>> for RecurrencePattern {
    type Error = String;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecurrencePattern> for Vec<u8> {
    fn from(value: RecurrencePattern) -> Self {
        value.weekdays
    }
}

/// Sort, de-duplicate and join weekday indices with [`PATTERN_KEY_SEPARATOR`].
pub fn canonical_key(days: &[u8]) -> String {
    let mut sorted = days.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(&PATTERN_KEY_SEPARATOR.to_string())
}

/// How `total_sessions` is shared between pattern groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
    /// One pool; any matching date draws from it
    #[default]
    Shared,
    /// Even split across groups, remainder to the earliest groups
    PerGroup,
}

/// Recurring plan expanded by the slot sequencer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub patterns: Vec<RecurrencePattern>,
    pub total_sessions: u32,
    pub session_duration_min: u32,
    pub start_date: NaiveDate,
    pub carry_forward: bool,
    #[serde(default)]
    pub include_start_date: bool,
    #[serde(default)]
    pub quota_policy: QuotaPolicy,
}

impl ScheduleSpec {
    pub fn new(
        patterns: Vec<RecurrencePattern>,
        total_sessions: u32,
        session_duration_min: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            patterns,
            total_sessions,
            session_duration_min,
            start_date,
            carry_forward: true,
            include_start_date: false,
            quota_policy: QuotaPolicy::Shared,
        }
    }

    pub fn with_carry_forward(mut self, carry_forward: bool) -> Self {
        self.carry_forward = carry_forward;
        self
    }

    pub fn with_start_date_included(mut self, include: bool) -> Self {
        self.include_start_date = include;
        self
    }

    pub fn with_quota_policy(mut self, policy: QuotaPolicy) -> Self {
        self.quota_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.patterns.is_empty() {
            return Err("At least one recurrence pattern is required".to_string());
        }
        if self.total_sessions == 0 {
            return Err("Total sessions must be greater than zero".to_string());
        }
        if self.session_duration_min == 0 {
            return Err("Session duration must be greater than zero".to_string());
        }
        if self.session_duration_min > MINUTES_PER_DAY {
            return Err("Session duration cannot exceed one day".to_string());
        }
        Ok(())
    }

    /// True when any group repeats on the given date's weekday.
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.patterns.iter().any(|p| p.matches(date))
    }
}

/// Per-weekday session start times, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTimes {
    pub default_start_minute: u32,
    #[serde(default)]
    pub by_weekday: BTreeMap<u8, u32>,
}

impl SlotTimes {
    pub fn uniform(start_minute: u32) -> Self {
        Self {
            default_start_minute: start_minute,
            by_weekday: BTreeMap::new(),
        }
    }

    pub fn with_weekday(mut self, weekday: u8, start_minute: u32) -> Self {
        self.by_weekday.insert(weekday, start_minute);
        self
    }

    pub fn start_for(&self, date: NaiveDate) -> u32 {
        self.by_weekday
            .get(&weekday_index(date))
            .copied()
            .unwrap_or(self.default_start_minute)
    }

    /// Every configured start must leave room for `duration` before midnight.
    pub fn validate(&self, duration: u32) -> Result<(), String> {
        let all = std::iter::once((None, self.default_start_minute))
            .chain(self.by_weekday.iter().map(|(d, m)| (Some(*d), *m)));
        for (weekday, start) in all {
            let fits = start
                .checked_add(duration)
                .is_some_and(|end| end <= MINUTES_PER_DAY);
            if !fits {
                return Err(match weekday {
                    Some(d) => format!(
                        "Session on {} would run past midnight",
                        WEEKDAY_LABELS[(d as usize).min(6)]
                    ),
                    None => "Default session time would run past midnight".to_string(),
                });
            }
        }
        Ok(())
    }
}
