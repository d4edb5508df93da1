//! Session quota bookkeeping across recurrence groups.

use crate::models::recurrence::{QuotaPolicy, RecurrencePattern};

/// Split `total` across `groups`, handing the remainder to the earliest groups.
///
/// ```
/// use coach_planner::services::schedule::quota::split_evenly;
/// assert_eq!(split_evenly(7, 3), vec![3, 2, 2]);
/// ```
pub fn split_evenly(total: u32, groups: usize) -> Vec<u32> {
    if groups == 0 {
        return Vec::new();
    }
    let groups_u32 = groups as u32;
    let base = total / groups_u32;
    let extra = total % groups_u32;
    (0..groups_u32)
        .map(|i| base + u32::from(i < extra))
        .collect()
}

/// Remaining quota for one expansion run.
pub(crate) struct QuotaLedger<'a> {
    patterns: &'a [RecurrencePattern],
    policy: QuotaPolicy,
    /// One pool for `Shared`, one entry per group for `PerGroup`
    remaining: Vec<u32>,
}

impl<'a> QuotaLedger<'a> {
    pub(crate) fn new(patterns: &'a [RecurrencePattern], total: u32, policy: QuotaPolicy) -> Self {
        let remaining = match policy {
            QuotaPolicy::Shared => vec![total],
            QuotaPolicy::PerGroup => split_evenly(total, patterns.len()),
        };
        Self {
            patterns,
            policy,
            remaining,
        }
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.remaining.iter().all(|r| *r == 0)
    }

    /// The group that owns a date falling on `weekday`, if any still has quota.
    pub(crate) fn owner_for(&self, weekday: u8) -> Option<usize> {
        match self.policy {
            QuotaPolicy::Shared => {
                if self.remaining[0] == 0 {
                    return None;
                }
                self.patterns.iter().position(|p| p.contains(weekday))
            }
            QuotaPolicy::PerGroup => self
                .patterns
                .iter()
                .enumerate()
                .position(|(i, p)| p.contains(weekday) && self.remaining[i] > 0),
        }
    }

    pub(crate) fn consume(&mut self, group: usize) {
        let slot = match self.policy {
            QuotaPolicy::Shared => &mut self.remaining[0],
            QuotaPolicy::PerGroup => &mut self.remaining[group],
        };
        *slot = slot.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(12, 1, vec![12]; "single group")]
    #[test_case(12, 2, vec![6, 6]; "even split")]
    #[test_case(7, 3, vec![3, 2, 2]; "remainder to earliest")]
    #[test_case(2, 3, vec![1, 1, 0]; "fewer sessions than groups")]
    #[test_case(5, 0, vec![]; "no groups")]
    fn test_split_evenly(total: u32, groups: usize, expected: Vec<u32>) {
        assert_eq!(split_evenly(total, groups), expected);
    }

    fn groups() -> Vec<RecurrencePattern> {
        vec![
            RecurrencePattern::new([1, 3, 5]).unwrap(),
            RecurrencePattern::new([2, 4, 6]).unwrap(),
            RecurrencePattern::new([1]).unwrap(),
        ]
    }

    #[test]
    fn test_shared_pool_uses_first_matching_group() {
        let patterns = groups();
        let mut ledger = QuotaLedger::new(&patterns, 2, QuotaPolicy::Shared);
        assert_eq!(ledger.owner_for(1), Some(0));
        assert_eq!(ledger.owner_for(4), Some(1));
        assert_eq!(ledger.owner_for(0), None);
        ledger.consume(0);
        ledger.consume(1);
        assert!(ledger.is_exhausted());
        assert_eq!(ledger.owner_for(1), None);
    }

    #[test]
    fn test_per_group_hands_over_shared_weekday() {
        let patterns = groups();
        let mut ledger = QuotaLedger::new(&patterns, 4, QuotaPolicy::PerGroup);
        // shares are 2, 1, 1
        ledger.consume(0);
        ledger.consume(0);
        // Monday now belongs to the third group
        assert_eq!(ledger.owner_for(1), Some(2));
        assert_eq!(ledger.owner_for(3), None);
        ledger.consume(2);
        ledger.consume(1);
        assert!(ledger.is_exhausted());
    }
}
