use chrono::NaiveDate;

use super::quota::QuotaLedger;
use crate::models::recurrence::{weekday_index, ScheduleSpec, SlotTimes};
use crate::models::session::{SessionBlock, SessionId, SessionStatus};
use crate::services::error::{SchedulingError, SchedulingResult};

/// Ten years of calendar days.
pub const DEFAULT_MAX_HORIZON_DAYS: u32 = 3660;

/// Availability verdict for one candidate slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotVerdict {
    Available,
    Unavailable { reason: String },
}

/// A candidate slot that was rejected and still consumed quota
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSlot {
    pub date: NaiveDate,
    pub start_minute: u32,
    pub end_minute: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceOutcome {
    pub blocks: Vec<SessionBlock>,
    pub skipped: Vec<SkippedSlot>,
}

/// Expands a [`ScheduleSpec`] into concrete session blocks.
///
/// Generated blocks carry provisional (negative) ids in emission order; the
/// output depends only on the inputs, so repeated calls are identical.
#[derive(Debug, Clone, Copy)]
pub struct SlotSequencer {
    max_horizon_days: u32,
}

impl Default for SlotSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotSequencer {
    pub fn new() -> Self {
        Self::with_horizon(DEFAULT_MAX_HORIZON_DAYS)
    }

    pub fn with_horizon(max_horizon_days: u32) -> Self {
        Self { max_horizon_days }
    }

    pub fn max_horizon_days(&self) -> u32 {
        self.max_horizon_days
    }

    /// Expand without availability feedback; always yields exactly
    /// `total_sessions` blocks or an error.
    pub fn generate(&self, spec: &ScheduleSpec, times: &SlotTimes) -> SchedulingResult<Vec<SessionBlock>> {
        self.generate_with(spec, times, |_| SlotVerdict::Available)
            .map(|outcome| outcome.blocks)
    }

    /// Expand while asking `verdict` about every candidate slot.
    ///
    /// With `carry_forward` a rejected slot leaves the quota untouched and the
    /// walk continues; without it the slot is recorded in `skipped` and counts
    /// against the quota.
    pub fn generate_with<F>(
        &self,
        spec: &ScheduleSpec,
        times: &SlotTimes,
        mut verdict: F,
    ) -> SchedulingResult<SequenceOutcome>
    where
        F: FnMut(&SessionBlock) -> SlotVerdict,
    {
        spec.validate()?;
        times.validate(spec.session_duration_min)?;

        let mut ledger = QuotaLedger::new(&spec.patterns, spec.total_sessions, spec.quota_policy);
        let mut outcome = SequenceOutcome::default();
        let mut date = if spec.include_start_date {
            Some(spec.start_date)
        } else {
            spec.start_date.succ_opt()
        };
        let mut walked = 0u32;

        while !ledger.is_exhausted() {
            let Some(current) = date else {
                return Err(SchedulingError::Validation(
                    "Schedule runs past the last representable date".to_string(),
                ));
            };
            if walked >= self.max_horizon_days {
                let err = SchedulingError::IterationCapExceeded {
                    horizon_days: self.max_horizon_days,
                    emitted: outcome.blocks.len() as u32,
                    requested: spec.total_sessions,
                };
                log::error!("Slot sequencing aborted: {}", err);
                return Err(err);
            }
            walked += 1;

            if let Some(group) = ledger.owner_for(weekday_index(current)) {
                let start = times.start_for(current);
                let ordinal = outcome.blocks.len() + 1;
                let block = SessionBlock {
                    id: -(ordinal as SessionId),
                    date: current,
                    start_minute: start,
                    end_minute: start + spec.session_duration_min,
                    status: SessionStatus::Scheduled,
                    title: format!("Session {}/{}", ordinal, spec.total_sessions),
                    note: None,
                    pattern: Some(spec.patterns[group].clone()),
                };

                match verdict(&block) {
                    SlotVerdict::Available => {
                        ledger.consume(group);
                        outcome.blocks.push(block);
                    }
                    SlotVerdict::Unavailable { reason } if spec.carry_forward => {
                        log::debug!("Carrying {} forward: {}", current, reason);
                    }
                    SlotVerdict::Unavailable { reason } => {
                        ledger.consume(group);
                        outcome.skipped.push(SkippedSlot {
                            date: current,
                            start_minute: block.start_minute,
                            end_minute: block.end_minute,
                            reason,
                        });
                    }
                }
            }

            date = current.succ_opt();
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recurrence::{QuotaPolicy, RecurrencePattern};
    use chrono::Weekday;
    use chrono::Datelike;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mwf() -> RecurrencePattern {
        RecurrencePattern::new([1, 3, 5]).unwrap()
    }

    fn tts() -> RecurrencePattern {
        RecurrencePattern::new([2, 4, 6]).unwrap()
    }

    #[test]
    fn test_generates_exact_count_after_start_date() {
        // Monday 2025-03-03 is not itself a candidate
        let spec = ScheduleSpec::new(vec![mwf()], 4, 60, date(2025, 3, 3));
        let blocks = SlotSequencer::new()
            .generate(&spec, &SlotTimes::uniform(9 * 60))
            .unwrap();

        let dates: Vec<NaiveDate> = blocks.iter().map(|b| b.date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 3, 5), date(2025, 3, 7), date(2025, 3, 10), date(2025, 3, 12)]
        );
        assert!(blocks.iter().all(|b| b.start_minute == 540 && b.end_minute == 600));
        assert_eq!(blocks[0].title, "Session 1/4");
        assert_eq!(blocks[3].id, -4);
    }

    #[test]
    fn test_start_date_included_on_request() {
        let spec = ScheduleSpec::new(vec![mwf()], 1, 45, date(2025, 3, 3))
            .with_start_date_included(true);
        let blocks = SlotSequencer::new()
            .generate(&spec, &SlotTimes::uniform(600))
            .unwrap();
        assert_eq!(blocks[0].date, date(2025, 3, 3));
        assert_eq!(blocks[0].end_minute, 645);
    }

    #[test]
    fn test_weekday_specific_times() {
        let spec = ScheduleSpec::new(vec![mwf()], 3, 60, date(2025, 3, 2));
        let times = SlotTimes::uniform(9 * 60).with_weekday(3, 18 * 60);
        let blocks = SlotSequencer::new().generate(&spec, &times).unwrap();
        assert_eq!(blocks[1].date.weekday(), Weekday::Wed);
        assert_eq!(blocks[1].start_minute, 18 * 60);
        assert_eq!(blocks[2].start_minute, 9 * 60);
    }

    #[test]
    fn test_output_is_repeatable() {
        let spec = ScheduleSpec::new(vec![mwf(), tts()], 10, 60, date(2025, 12, 28));
        let sequencer = SlotSequencer::new();
        let times = SlotTimes::uniform(480);
        assert_eq!(
            sequencer.generate(&spec, &times).unwrap(),
            sequencer.generate(&spec, &times).unwrap()
        );
    }

    #[test]
    fn test_blocks_tagged_with_owning_group() {
        let spec = ScheduleSpec::new(vec![mwf(), tts()], 6, 60, date(2025, 3, 2));
        let blocks = SlotSequencer::new()
            .generate(&spec, &SlotTimes::uniform(480))
            .unwrap();
        for block in &blocks {
            let pattern = block.pattern.as_ref().unwrap();
            assert!(pattern.matches(block.date));
        }
    }

    #[test]
    fn test_per_group_quota_split() {
        // Groups Mon and Sat only, 3 sessions => Mon gets 2, Sat gets 1
        let mon = RecurrencePattern::new([1]).unwrap();
        let sat = RecurrencePattern::new([6]).unwrap();
        let spec = ScheduleSpec::new(vec![mon.clone(), sat.clone()], 3, 60, date(2025, 3, 2))
            .with_quota_policy(QuotaPolicy::PerGroup);
        let blocks = SlotSequencer::new()
            .generate(&spec, &SlotTimes::uniform(480))
            .unwrap();
        let mondays = blocks.iter().filter(|b| b.pattern.as_ref() == Some(&mon)).count();
        let saturdays = blocks.iter().filter(|b| b.pattern.as_ref() == Some(&sat)).count();
        assert_eq!((mondays, saturdays), (2, 1));
        assert_eq!(blocks.last().unwrap().date, date(2025, 3, 10));
    }

    #[test]
    fn test_carry_forward_keeps_quota() {
        let spec = ScheduleSpec::new(vec![mwf()], 3, 60, date(2025, 3, 2));
        let taken = date(2025, 3, 5);
        let outcome = SlotSequencer::new()
            .generate_with(&spec, &SlotTimes::uniform(480), |block| {
                if block.date == taken {
                    SlotVerdict::Unavailable {
                        reason: "Coach unavailable".to_string(),
                    }
                } else {
                    SlotVerdict::Available
                }
            })
            .unwrap();
        let dates: Vec<NaiveDate> = outcome.blocks.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![date(2025, 3, 3), date(2025, 3, 7), date(2025, 3, 10)]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.blocks[1].title, "Session 2/3");
    }

    #[test]
    fn test_without_carry_forward_rejections_consume_quota() {
        let spec = ScheduleSpec::new(vec![mwf()], 3, 60, date(2025, 3, 2)).with_carry_forward(false);
        let outcome = SlotSequencer::new()
            .generate_with(&spec, &SlotTimes::uniform(480), |block| {
                if block.date == date(2025, 3, 5) {
                    SlotVerdict::Unavailable {
                        reason: "Booked".to_string(),
                    }
                } else {
                    SlotVerdict::Available
                }
            })
            .unwrap();
        assert_eq!(outcome.blocks.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, "Booked");
        assert_eq!(outcome.blocks[1].date, date(2025, 3, 7));
    }

    #[test]
    fn test_iteration_cap_when_everything_rejected() {
        let spec = ScheduleSpec::new(vec![mwf()], 2, 60, date(2025, 3, 2));
        let result = SlotSequencer::with_horizon(60).generate_with(
            &spec,
            &SlotTimes::uniform(480),
            |_| SlotVerdict::Unavailable {
                reason: "Full".to_string(),
            },
        );
        assert_eq!(
            result.unwrap_err(),
            SchedulingError::IterationCapExceeded {
                horizon_days: 60,
                emitted: 0,
                requested: 2,
            }
        );
    }

    #[test]
    fn test_iteration_cap_for_oversized_request() {
        let spec = ScheduleSpec::new(vec![RecurrencePattern::new([0]).unwrap()], 10, 60, date(2025, 1, 1));
        let result = SlotSequencer::with_horizon(28).generate(&spec, &SlotTimes::uniform(480));
        assert!(matches!(
            result,
            Err(SchedulingError::IterationCapExceeded { emitted: 4, .. })
        ));
    }

    #[test]
    fn test_validation_errors_before_walking() {
        let spec = ScheduleSpec::new(vec![], 3, 60, date(2025, 3, 2));
        assert!(matches!(
            SlotSequencer::new().generate(&spec, &SlotTimes::uniform(480)),
            Err(SchedulingError::Validation(_))
        ));

        let spec = ScheduleSpec::new(vec![mwf()], 3, 90, date(2025, 3, 2));
        assert!(matches!(
            SlotSequencer::new().generate(&spec, &SlotTimes::uniform(23 * 60)),
            Err(SchedulingError::Validation(_))
        ));
    }
}
