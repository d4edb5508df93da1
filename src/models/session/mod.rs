// Session module
// Concrete scheduled occurrences rendered on the weekly time grid

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::recurrence::RecurrencePattern;

/// Minutes in a calendar day; the exclusive upper bound for `end_minute`.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

pub type SessionId = i64;

/// Lifecycle state of a scheduled session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Completed,
    Missed,
    Cancelled,
    Rescheduled,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 5] = [
        SessionStatus::Scheduled,
        SessionStatus::Completed,
        SessionStatus::Missed,
        SessionStatus::Cancelled,
        SessionStatus::Rescheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Missed => "missed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }

    /// Cancelled sessions no longer occupy their time slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, SessionStatus::Cancelled)
    }
}

/// One concrete session occurrence.
///
/// Times are stored as minutes since midnight so that a session may end at
/// exactly 24:00 without spilling into the next date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBlock {
    pub id: SessionId,
    pub date: NaiveDate,
    pub start_minute: u32,
    pub end_minute: u32,
    pub status: SessionStatus,
    pub title: String,
    pub note: Option<String>,
    /// Recurrence group this block was generated from, if any
    pub pattern: Option<RecurrencePattern>,
}

impl SessionBlock {
    /// Create a scheduled block with validation
    ///
    /// # Examples
    /// ```
    /// use coach_planner::models::session::SessionBlock;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    /// let block = SessionBlock::new(1, date, 9 * 60, 10 * 60, "Strength").unwrap();
    /// assert_eq!(block.duration_minutes(), 60);
    /// ```
    pub fn new(
        id: SessionId,
        date: NaiveDate,
        start_minute: u32,
        end_minute: u32,
        title: impl Into<String>,
    ) -> Result<Self, String> {
        let block = Self {
            id,
            date,
            start_minute,
            end_minute,
            status: SessionStatus::Scheduled,
            title: title.into(),
            note: None,
            pattern: None,
        };
        block.validate()?;
        Ok(block)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_span(self.start_minute, self.end_minute)
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute.saturating_sub(self.start_minute)
    }

    pub fn start_time(&self) -> NaiveTime {
        minute_to_time(self.start_minute)
    }

    pub fn end_time(&self) -> NaiveTime {
        minute_to_time(self.end_minute)
    }

    /// True while the server has not yet assigned an id.
    pub fn is_provisional(&self) -> bool {
        self.id < 0
    }

    /// Half-open interval overlap on the same date.
    pub fn overlaps(&self, date: NaiveDate, start_minute: u32, end_minute: u32) -> bool {
        self.date == date && self.start_minute < end_minute && start_minute < self.end_minute
    }

    /// Apply a patch, returning the updated copy.
    pub fn patched(&self, patch: &SessionPatch) -> Result<SessionBlock, String> {
        let mut next = self.clone();
        if let Some(date) = patch.date {
            next.date = date;
        }
        if let Some(start) = patch.start_minute {
            next.start_minute = start;
        }
        if let Some(end) = patch.end_minute {
            next.end_minute = end;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(ref title) = patch.title {
            next.title = title.clone();
        }
        if let Some(ref note) = patch.note {
            next.note = if note.trim().is_empty() {
                None
            } else {
                Some(note.clone())
            };
        }
        next.validate()?;
        Ok(next)
    }
}

/// Request payload for creating a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub date: NaiveDate,
    pub start_minute: u32,
    pub end_minute: u32,
    pub title: Option<String>,
    pub pattern: Option<RecurrencePattern>,
}

impl NewSession {
    pub fn new(date: NaiveDate, start_minute: u32, end_minute: u32) -> Self {
        Self {
            date,
            start_minute,
            end_minute,
            title: None,
            pattern: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_span(self.start_minute, self.end_minute)
    }

    /// Materialise the request as a block carrying the given id.
    pub fn into_block(self, id: SessionId) -> SessionBlock {
        SessionBlock {
            id,
            date: self.date,
            start_minute: self.start_minute,
            end_minute: self.end_minute,
            status: SessionStatus::Scheduled,
            title: self.title.unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
            note: None,
            pattern: self.pattern,
        }
    }
}

pub const DEFAULT_SESSION_TITLE: &str = "Session";

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    pub date: Option<NaiveDate>,
    pub start_minute: Option<u32>,
    pub end_minute: Option<u32>,
    pub status: Option<SessionStatus>,
    pub title: Option<String>,
    /// An empty string clears the note
    pub note: Option<String>,
}

impl SessionPatch {
    pub fn times(date: NaiveDate, start_minute: u32, end_minute: u32) -> Self {
        Self {
            date: Some(date),
            start_minute: Some(start_minute),
            end_minute: Some(end_minute),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn validate_span(start_minute: u32, end_minute: u32) -> Result<(), String> {
    if end_minute <= start_minute {
        return Err("Session end time must be after start time".to_string());
    }
    if end_minute > MINUTES_PER_DAY {
        return Err("Session must end on the same date it starts".to_string());
    }
    Ok(())
}

/// Convert minutes since midnight into a wall-clock time; 24:00 maps to 23:59.
pub fn minute_to_time(minute: u32) -> NaiveTime {
    let minute = minute.min(MINUTES_PER_DAY - 1);
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap_or(NaiveTime::MIN)
}
