//! Recurring plan editor: weekday groups, session count and start time.
//!
//! A local draft is expanded with [`SlotSequencer`] as soon as the inputs are
//! valid. The gateway preview, which also skips slots that are already booked,
//! replaces it when it arrives.

use chrono::{Local, NaiveDate};
use egui::RichText;

use super::time_grid::parse_color;
use crate::models::recurrence::{QuotaPolicy, RecurrencePattern, ScheduleSpec, SlotTimes};
use crate::models::session::{NewSession, SessionBlock};
use crate::services::availability::{AvailabilitySlot, SlotPicker};
use crate::services::error::{SchedulingError, SchedulingResult};
use crate::services::palette::ColorAssigner;
use crate::services::schedule::SlotSequencer;
use crate::utils::date::format_minute;

/// Checkbox order in the UI, Monday first; values are weekday indices.
const WEEKDAY_COLUMNS: [(u8, &str); 7] = [
    (1, "Mon"),
    (2, "Tue"),
    (3, "Wed"),
    (4, "Thu"),
    (5, "Fri"),
    (6, "Sat"),
    (0, "Sun"),
];

const MAX_GROUPS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerAction {
    CheckAvailability {
        patterns: Vec<RecurrencePattern>,
        package_id: i64,
        from: NaiveDate,
    },
    Preview {
        spec: ScheduleSpec,
        times: SlotTimes,
    },
    Book(Vec<NewSession>),
}

#[derive(Debug, Clone)]
pub enum PreviewState {
    Empty,
    Draft(Vec<SessionBlock>),
    Checked(Vec<SessionBlock>),
    Failed(String),
}

pub struct PlannerPanel {
    groups: Vec<[bool; 7]>,
    pub total_sessions: u32,
    pub duration_minutes: u32,
    pub start_date: NaiveDate,
    start_date_text: String,
    pub start_minute: u32,
    pub carry_forward: bool,
    pub include_start_date: bool,
    pub quota_policy: QuotaPolicy,
    pub package_id: i64,
    picker: SlotPicker,
    preview: PreviewState,
    sequencer: SlotSequencer,
}

impl PlannerPanel {
    pub fn new(sequencer: SlotSequencer, quota_policy: QuotaPolicy, duration_minutes: u32) -> Self {
        let today = Local::now().date_naive();
        Self {
            groups: vec![[false; 7]],
            total_sessions: 12,
            duration_minutes,
            start_date: today,
            start_date_text: today.to_string(),
            start_minute: 9 * 60,
            carry_forward: true,
            include_start_date: false,
            quota_policy,
            package_id: 1,
            picker: SlotPicker::default(),
            preview: PreviewState::Empty,
            sequencer,
        }
    }

    /// Tick `weekday` (0 = Sunday) in group `group`, adding groups as needed.
    pub fn set_weekday(&mut self, group: usize, weekday: u8, on: bool) {
        if group >= MAX_GROUPS || weekday > 6 {
            return;
        }
        while self.groups.len() <= group {
            self.groups.push([false; 7]);
        }
        self.groups[group][weekday as usize] = on;
        self.invalidate_preview();
    }

    /// Non-empty groups as patterns.
    pub fn patterns(&self) -> SchedulingResult<Vec<RecurrencePattern>> {
        let patterns = self
            .groups
            .iter()
            .filter(|days| days.iter().any(|d| *d))
            .map(|days| {
                RecurrencePattern::new(
                    days.iter()
                        .enumerate()
                        .filter(|(_, on)| **on)
                        .map(|(i, _)| i as u8),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        if patterns.is_empty() {
            return Err(SchedulingError::Validation(
                "Pick at least one weekday".to_string(),
            ));
        }
        Ok(patterns)
    }

    pub fn spec(&self) -> SchedulingResult<ScheduleSpec> {
        let spec = ScheduleSpec::new(
            self.patterns()?,
            self.total_sessions,
            self.duration_minutes,
            self.start_date,
        )
        .with_carry_forward(self.carry_forward)
        .with_start_date_included(self.include_start_date)
        .with_quota_policy(self.quota_policy);
        spec.validate()?;
        Ok(spec)
    }

    pub fn times(&self) -> SlotTimes {
        SlotTimes::uniform(self.start_minute)
    }

    /// Expand locally, without availability.
    pub fn draft(&self) -> SchedulingResult<Vec<SessionBlock>> {
        self.sequencer.generate(&self.spec()?, &self.times())
    }

    pub fn refresh_draft(&mut self) {
        self.preview = match self.draft() {
            Ok(blocks) => PreviewState::Draft(blocks),
            Err(err) => PreviewState::Failed(err.to_string()),
        };
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    pub fn apply_preview(&mut self, result: SchedulingResult<Vec<SessionBlock>>) {
        self.preview = match result {
            Ok(blocks) => PreviewState::Checked(blocks),
            Err(err) => PreviewState::Failed(err.to_string()),
        };
    }

    pub fn apply_availability(&mut self, result: SchedulingResult<Vec<AvailabilitySlot>>) {
        match result {
            Ok(slots) => {
                self.picker = SlotPicker::new(slots);
                // Keep the chosen start if it is still open
                if self.picker.select(self.start_minute).is_err() {
                    self.picker.clear();
                }
            }
            Err(err) => {
                log::warn!("Availability check failed: {}", err);
                self.picker = SlotPicker::default();
            }
        }
    }

    pub fn picker(&self) -> &SlotPicker {
        &self.picker
    }

    /// Pick a start time from the availability list.
    pub fn choose_slot(&mut self, start_minute: u32) -> SchedulingResult<()> {
        let (start, end) = {
            let slot = self.picker.select(start_minute)?;
            (slot.start_minute, slot.end_minute)
        };
        self.start_minute = start;
        self.duration_minutes = end - start;
        self.invalidate_preview();
        Ok(())
    }

    /// Create requests for the currently previewed blocks.
    pub fn book_requests(&self) -> Vec<NewSession> {
        let blocks = match &self.preview {
            PreviewState::Draft(blocks) | PreviewState::Checked(blocks) => blocks,
            _ => return Vec::new(),
        };
        blocks
            .iter()
            .map(|block| NewSession {
                date: block.date,
                start_minute: block.start_minute,
                end_minute: block.end_minute,
                title: Some(block.title.clone()),
                pattern: block.pattern.clone(),
            })
            .collect()
    }

    fn invalidate_preview(&mut self) {
        self.preview = PreviewState::Empty;
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<PlannerAction> {
        let mut action = None;
        let mut changed = false;

        ui.heading("Recurring plan");
        ui.add_space(4.0);

        for group in 0..self.groups.len() {
            ui.horizontal(|ui| {
                let swatch = self
                    .pattern_for(group)
                    .and_then(|p| parse_color(ColorAssigner::color_for(p.weekdays())))
                    .unwrap_or(ui.visuals().weak_text_color());
                ui.label(RichText::new("■").color(swatch));
                for (weekday, label) in WEEKDAY_COLUMNS {
                    changed |= ui
                        .checkbox(&mut self.groups[group][weekday as usize], label)
                        .changed();
                }
            });
        }
        ui.horizontal(|ui| {
            if self.groups.len() < MAX_GROUPS && ui.small_button("+ group").clicked() {
                self.groups.push([false; 7]);
            }
            if self.groups.len() > 1 && ui.small_button("− group").clicked() {
                self.groups.pop();
                changed = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Sessions");
            changed |= ui
                .add(egui::DragValue::new(&mut self.total_sessions).range(1..=500))
                .changed();
            ui.label("Minutes");
            changed |= ui
                .add(egui::DragValue::new(&mut self.duration_minutes).range(5..=480))
                .changed();
        });

        ui.horizontal(|ui| {
            ui.label("Start after");
            let response = ui.add(egui::TextEdit::singleline(&mut self.start_date_text).desired_width(90.0));
            if response.changed() {
                if let Ok(date) = NaiveDate::parse_from_str(self.start_date_text.trim(), "%Y-%m-%d") {
                    self.start_date = date;
                    changed = true;
                }
            }
            changed |= ui
                .checkbox(&mut self.include_start_date, "inclusive")
                .changed();
        });

        ui.horizontal(|ui| {
            changed |= ui
                .checkbox(&mut self.carry_forward, "Carry forward")
                .on_hover_text("Booked slots do not use up a session")
                .changed();
            egui::ComboBox::from_id_source("quota_policy")
                .selected_text(match self.quota_policy {
                    QuotaPolicy::Shared => "Shared count",
                    QuotaPolicy::PerGroup => "Split per group",
                })
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut self.quota_policy, QuotaPolicy::Shared, "Shared count")
                        .changed();
                    changed |= ui
                        .selectable_value(&mut self.quota_policy, QuotaPolicy::PerGroup, "Split per group")
                        .changed();
                });
        });

        ui.horizontal(|ui| {
            ui.label(format!("Starts at {}", format_minute(self.start_minute)));
            if ui.button("Check times").clicked() {
                match self.patterns() {
                    Ok(patterns) => {
                        action = Some(PlannerAction::CheckAvailability {
                            patterns,
                            package_id: self.package_id,
                            from: self.start_date,
                        })
                    }
                    Err(err) => self.preview = PreviewState::Failed(err.to_string()),
                }
            }
        });
        self.show_slots(ui, &mut changed);

        if changed {
            self.refresh_draft();
        }

        ui.separator();
        self.show_preview(ui);

        ui.horizontal(|ui| {
            let spec = self.spec();
            if ui.add_enabled(spec.is_ok(), egui::Button::new("Check preview")).clicked() {
                if let Ok(spec) = spec {
                    action = Some(PlannerAction::Preview {
                        spec,
                        times: self.times(),
                    });
                }
            }
            let requests = self.book_requests();
            if ui
                .add_enabled(!requests.is_empty(), egui::Button::new("Book all"))
                .clicked()
            {
                action = Some(PlannerAction::Book(requests));
                self.invalidate_preview();
            }
        });

        action
    }

    fn pattern_for(&self, group: usize) -> Option<RecurrencePattern> {
        let days = self.groups.get(group)?;
        RecurrencePattern::new(
            days.iter()
                .enumerate()
                .filter(|(_, on)| **on)
                .map(|(i, _)| i as u8),
        )
        .ok()
    }

    fn show_slots(&mut self, ui: &mut egui::Ui, changed: &mut bool) {
        if self.picker.slots().is_empty() {
            return;
        }
        let mut chosen = None;
        ui.horizontal_wrapped(|ui| {
            let selected = self.picker.selected().map(|s| s.start_minute);
            for slot in self.picker.slots() {
                let response = ui.add_enabled(
                    slot.ok,
                    egui::SelectableLabel::new(selected == Some(slot.start_minute), slot.label()),
                );
                let response = match &slot.reason {
                    Some(reason) => response.on_disabled_hover_text(reason.as_str()),
                    None => response,
                };
                if response.clicked() {
                    chosen = Some(slot.start_minute);
                }
            }
        });
        if let Some(start) = chosen {
            match self.choose_slot(start) {
                Ok(()) => *changed = true,
                Err(err) => self.preview = PreviewState::Failed(err.to_string()),
            }
        }
    }

    fn show_preview(&self, ui: &mut egui::Ui) {
        let (blocks, checked) = match &self.preview {
            PreviewState::Empty => {
                ui.label(RichText::new("Pick weekdays to see the plan").weak());
                return;
            }
            PreviewState::Failed(message) => {
                ui.colored_label(ui.visuals().error_fg_color, message);
                return;
            }
            PreviewState::Draft(blocks) => (blocks, false),
            PreviewState::Checked(blocks) => (blocks, true),
        };

        ui.label(if checked {
            format!("{} sessions, checked against bookings", blocks.len())
        } else {
            format!("{} sessions (draft)", blocks.len())
        });
        egui::ScrollArea::vertical()
            .id_source("plan_preview")
            .max_height(160.0)
            .show(ui, |ui| {
                for block in blocks {
                    ui.label(format!(
                        "{}  {}–{}",
                        block.date.format("%a %-d %b"),
                        format_minute(block.start_minute),
                        format_minute(block.end_minute)
                    ));
                }
            });
    }
}
