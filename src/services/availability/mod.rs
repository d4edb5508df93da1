//! Availability verdicts for a recurring combo and the slot picker built on them.

use serde::{Deserialize, Serialize};

use crate::services::error::{SchedulingError, SchedulingResult};
use crate::utils::date::format_minute;

/// One candidate time of day and whether it can be booked for the combo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub start_minute: u32,
    pub end_minute: u32,
    pub ok: bool,
    pub reason: Option<String>,
}

impl AvailabilitySlot {
    pub fn open(start_minute: u32, end_minute: u32) -> Self {
        Self {
            start_minute,
            end_minute,
            ok: true,
            reason: None,
        }
    }

    pub fn taken(start_minute: u32, end_minute: u32, reason: impl Into<String>) -> Self {
        Self {
            start_minute,
            end_minute,
            ok: false,
            reason: Some(reason.into()),
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{}–{}",
            format_minute(self.start_minute),
            format_minute(self.end_minute)
        )
    }
}

/// Picker over the slots returned by an availability check.
///
/// Slots reported as taken stay visible with their reason but can never be
/// selected.
#[derive(Debug, Clone, Default)]
pub struct SlotPicker {
    slots: Vec<AvailabilitySlot>,
    selected: Option<usize>,
}

impl SlotPicker {
    pub fn new(mut slots: Vec<AvailabilitySlot>) -> Self {
        slots.sort_by_key(|s| s.start_minute);
        Self {
            slots,
            selected: None,
        }
    }

    pub fn slots(&self) -> &[AvailabilitySlot] {
        &self.slots
    }

    pub fn selectable(&self) -> impl Iterator<Item = &AvailabilitySlot> {
        self.slots.iter().filter(|s| s.ok)
    }

    pub fn selected(&self) -> Option<&AvailabilitySlot> {
        self.selected.map(|i| &self.slots[i])
    }

    /// Select the slot starting at `start_minute`.
    pub fn select(&mut self, start_minute: u32) -> SchedulingResult<&AvailabilitySlot> {
        let index = self
            .slots
            .iter()
            .position(|s| s.start_minute == start_minute)
            .ok_or_else(|| {
                SchedulingError::Validation(format!(
                    "No slot starts at {}",
                    format_minute(start_minute)
                ))
            })?;

        let slot = &self.slots[index];
        if !slot.ok {
            return Err(SchedulingError::Conflict {
                reason: slot
                    .reason
                    .clone()
                    .unwrap_or_else(|| "Slot already taken".to_string()),
            });
        }

        self.selected = Some(index);
        Ok(&self.slots[index])
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker() -> SlotPicker {
        SlotPicker::new(vec![
            AvailabilitySlot::open(600, 660),
            AvailabilitySlot::taken(540, 600, "Booked by another client"),
            AvailabilitySlot::open(660, 720),
        ])
    }

    #[test]
    fn test_slots_sorted_and_filtered() {
        let picker = picker();
        let starts: Vec<u32> = picker.slots().iter().map(|s| s.start_minute).collect();
        assert_eq!(starts, vec![540, 600, 660]);
        assert_eq!(picker.selectable().count(), 2);
    }

    #[test]
    fn test_select_open_slot() {
        let mut picker = picker();
        let slot = picker.select(600).unwrap();
        assert_eq!(slot.label(), "10:00–11:00");
        assert_eq!(picker.selected().map(|s| s.start_minute), Some(600));
    }

    #[test]
    fn test_taken_slot_is_conflict_and_keeps_selection() {
        let mut picker = picker();
        picker.select(660).unwrap();
        let err = picker.select(540).unwrap_err();
        assert_eq!(
            err,
            SchedulingError::Conflict {
                reason: "Booked by another client".to_string()
            }
        );
        assert_eq!(picker.selected().map(|s| s.start_minute), Some(660));
    }

    #[test]
    fn test_unknown_slot_is_validation_error() {
        let mut picker = picker();
        assert!(matches!(
            picker.select(100),
            Err(SchedulingError::Validation(_))
        ));
    }
}
