//! Detail editor for the selected session.

use egui::RichText;

use super::time_grid::block_color;
use crate::models::session::{SessionBlock, SessionId, SessionPatch, SessionStatus};
use crate::utils::date::format_minute;

#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Save { id: SessionId, patch: SessionPatch },
    Delete(SessionId),
    Close,
}

/// Editable copy of the selected block's text fields and status.
#[derive(Debug, Clone)]
pub struct SessionPanel {
    id: SessionId,
    title: String,
    note: String,
    status: SessionStatus,
    confirm_delete: bool,
}

impl SessionPanel {
    pub fn open(block: &SessionBlock) -> Self {
        Self {
            id: block.id,
            title: block.title.clone(),
            note: block.note.clone().unwrap_or_default(),
            status: block.status,
            confirm_delete: false,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    /// Fields that differ from `block`; `None` when nothing changed.
    pub fn patch_against(&self, block: &SessionBlock) -> Result<Option<SessionPatch>, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title cannot be empty".to_string());
        }

        let mut patch = SessionPatch::default();
        if title != block.title {
            patch.title = Some(title.to_string());
        }
        if self.note.trim() != block.note.as_deref().unwrap_or("").trim() {
            patch.note = Some(self.note.trim().to_string());
        }
        if self.status != block.status {
            patch.status = Some(self.status);
        }
        Ok((!patch.is_empty()).then_some(patch))
    }

    pub fn show(&mut self, ui: &mut egui::Ui, block: &SessionBlock) -> Option<PanelAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.label(RichText::new("●").color(block_color(block)));
            ui.heading("Session");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("✕").on_hover_text("Close").clicked() {
                    action = Some(PanelAction::Close);
                }
            });
        });
        ui.label(format!(
            "{}  {}–{}",
            block.date.format("%a %-d %b %Y"),
            format_minute(block.start_minute),
            format_minute(block.end_minute)
        ));
        if let Some(pattern) = &block.pattern {
            ui.label(RichText::new(format!("Repeats {}", pattern.label())).weak());
        }
        ui.separator();

        ui.label("Title");
        ui.text_edit_singleline(&mut self.title);
        ui.add_space(4.0);

        ui.label("Note");
        ui.add(egui::TextEdit::multiline(&mut self.note).desired_rows(4));
        ui.add_space(4.0);

        egui::ComboBox::from_label("Status")
            .selected_text(status_label(self.status))
            .show_ui(ui, |ui| {
                for status in SessionStatus::ALL {
                    ui.selectable_value(&mut self.status, status, status_label(status));
                }
            });
        ui.add_space(8.0);

        let validation = self.patch_against(block);
        if let Err(message) = &validation {
            ui.colored_label(ui.visuals().error_fg_color, message);
        }

        ui.horizontal(|ui| {
            let can_save = matches!(validation, Ok(Some(_)));
            if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                if let Ok(Some(patch)) = validation {
                    action = Some(PanelAction::Save { id: self.id, patch });
                }
            }

            if self.confirm_delete {
                if ui.button("Confirm delete").clicked() {
                    action = Some(PanelAction::Delete(self.id));
                }
                if ui.button("Keep").clicked() {
                    self.confirm_delete = false;
                }
            } else if ui.button("Delete").clicked() {
                self.confirm_delete = true;
            }
        });

        action
    }
}

pub fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Scheduled => "Scheduled",
        SessionStatus::Completed => "Completed",
        SessionStatus::Missed => "Missed",
        SessionStatus::Cancelled => "Cancelled",
        SessionStatus::Rescheduled => "Rescheduled",
    }
}
