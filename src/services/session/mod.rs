//! Session request/response contract and the in-memory board that applies
//! its results optimistically.

pub mod board;
pub mod dispatch;
mod store;

pub use store::{AvailabilityGrid, LocalSessionStore};

use chrono::NaiveDate;

use crate::models::recurrence::{RecurrencePattern, ScheduleSpec, SlotTimes};
use crate::models::session::{NewSession, SessionBlock, SessionId, SessionPatch};
use crate::services::availability::AvailabilitySlot;
use crate::services::error::SchedulingResult;

/// Backend that owns persisted sessions and arbitrates conflicts.
///
/// Every call may be rejected; rejections carry a reason and are surfaced as
/// [`SchedulingError`](crate::services::error::SchedulingError) values.
#[cfg_attr(test, mockall::automock)]
pub trait SessionGateway: Send + Sync {
    fn create(&self, request: NewSession) -> SchedulingResult<SessionBlock>;

    fn update(&self, id: SessionId, patch: SessionPatch) -> SchedulingResult<SessionBlock>;

    fn delete(&self, id: SessionId) -> SchedulingResult<()>;

    /// Availability-aware expansion of a recurrence spec
    fn preview(&self, spec: &ScheduleSpec, times: &SlotTimes) -> SchedulingResult<Vec<SessionBlock>>;

    /// Per-time-slot verdicts for a recurring combo, looking ahead from `from`
    fn check_availability(
        &self,
        patterns: &[RecurrencePattern],
        package_id: i64,
        from: NaiveDate,
    ) -> SchedulingResult<Vec<AvailabilitySlot>>;

    /// Sessions dated within `from..=to`
    fn list_range(&self, from: NaiveDate, to: NaiveDate) -> SchedulingResult<Vec<SessionBlock>>;
}
