//! Booking-mode picker with a debounced route lookup for at-client sessions.

use egui::RichText;

use crate::models::travel::{BookingMode, Coordinate, TravelPolicy};
use crate::services::travel::debounce::LookupDebouncer;
use crate::services::travel::{quote_modes, ModeQuote, RouteOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    /// One or both points missing or invalid
    Idle,
    Waiting(u64),
    Done(RouteOutcome),
}

pub struct TravelPanel {
    origin_text: String,
    destination_text: String,
    origin: Result<Coordinate, String>,
    destination: Result<Coordinate, String>,
    lookup: LookupState,
    policy: TravelPolicy,
    selected_mode: BookingMode,
}

impl TravelPanel {
    pub fn new(policy: TravelPolicy) -> Self {
        Self {
            origin_text: String::new(),
            destination_text: String::new(),
            origin: Err(String::new()),
            destination: Err(String::new()),
            lookup: LookupState::Idle,
            policy,
            selected_mode: BookingMode::AtCoach,
        }
    }

    pub fn set_policy(&mut self, policy: TravelPolicy) {
        self.policy = policy;
        self.ensure_selectable();
    }

    pub fn selected_mode(&self) -> BookingMode {
        self.selected_mode
    }

    pub fn lookup_state(&self) -> &LookupState {
        &self.lookup
    }

    /// Update one address field; a valid pair schedules a lookup.
    pub fn set_points(&mut self, debouncer: &mut LookupDebouncer, origin: &str, destination: &str) {
        self.origin_text = origin.to_string();
        self.destination_text = destination.to_string();
        self.points_changed(debouncer);
    }

    fn points_changed(&mut self, debouncer: &mut LookupDebouncer) {
        self.origin = parse_field(&self.origin_text);
        self.destination = parse_field(&self.destination_text);
        match (&self.origin, &self.destination) {
            (Ok(origin), Ok(destination)) => {
                let sequence = debouncer.request(*origin, *destination);
                self.lookup = LookupState::Waiting(sequence);
            }
            _ => {
                debouncer.reset();
                self.lookup = LookupState::Idle;
            }
        }
        self.ensure_selectable();
    }

    /// Take the latest route answer, if one has arrived.
    pub fn poll(&mut self, debouncer: &mut LookupDebouncer) -> bool {
        let Some(response) = debouncer.poll() else {
            return false;
        };
        match self.lookup {
            LookupState::Waiting(sequence) if sequence == response.sequence => {
                self.lookup = LookupState::Done(response.outcome);
                self.ensure_selectable();
                true
            }
            _ => false,
        }
    }

    /// Quotes for every mode. Until a route is known, at-client is blocked.
    pub fn quotes(&self) -> Vec<ModeQuote> {
        match &self.lookup {
            LookupState::Done(outcome) => quote_modes(outcome, &self.policy),
            _ => quote_modes(
                &RouteOutcome::PointsOnly {
                    origin: self.origin.clone().unwrap_or(Coordinate { lat: 0.0, lon: 0.0 }),
                    destination: self
                        .destination
                        .clone()
                        .unwrap_or(Coordinate { lat: 0.0, lon: 0.0 }),
                    reason: match self.lookup {
                        LookupState::Waiting(_) => "Looking up route".to_string(),
                        _ => "Enter both locations".to_string(),
                    },
                },
                &self.policy,
            ),
        }
    }

    /// Choose a mode; blocked modes are refused.
    pub fn select_mode(&mut self, mode: BookingMode) -> bool {
        let selectable = self
            .quotes()
            .iter()
            .any(|q| q.mode == mode && q.is_selectable());
        if selectable {
            self.selected_mode = mode;
        }
        selectable
    }

    fn ensure_selectable(&mut self) {
        if !self.select_mode(self.selected_mode) {
            self.selected_mode = BookingMode::AtCoach;
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, debouncer: &mut LookupDebouncer) {
        ui.heading("Location");
        let mut changed = false;
        egui::Grid::new("travel_points").num_columns(2).show(ui, |ui| {
            ui.label("Coach");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut self.origin_text).hint_text("lat, lon"))
                .changed();
            ui.end_row();
            ui.label("Client");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut self.destination_text).hint_text("lat, lon"))
                .changed();
            ui.end_row();
        });
        if changed {
            self.points_changed(debouncer);
        }

        for (label, field) in [("Coach", &self.origin), ("Client", &self.destination)] {
            if let Err(message) = field {
                if !message.is_empty() {
                    ui.colored_label(ui.visuals().error_fg_color, format!("{}: {}", label, message));
                }
            }
        }

        match &self.lookup {
            LookupState::Idle => {}
            LookupState::Waiting(_) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Looking up route…");
                });
            }
            LookupState::Done(RouteOutcome::Route(estimate)) => {
                ui.label(format!(
                    "{:.1} km, about {:.0} min",
                    estimate.distance_km, estimate.duration_min
                ));
            }
            LookupState::Done(RouteOutcome::PointsOnly {
                origin,
                destination,
                reason,
            }) => {
                ui.label(format!(
                    "Coach {:.4}, {:.4} · Client {:.4}, {:.4}",
                    origin.lat, origin.lon, destination.lat, destination.lon
                ));
                ui.label(RichText::new(format!("Route unavailable: {}", reason)).weak());
            }
        }

        ui.add_space(4.0);
        let mut chosen = None;
        for quote in self.quotes() {
            let text = if quote.fee > 0 {
                format!("{} (+{} travel fee)", quote.mode.label(), quote.fee)
            } else {
                quote.mode.label().to_string()
            };
            let response = ui.add_enabled(
                quote.is_selectable(),
                egui::RadioButton::new(self.selected_mode == quote.mode, text),
            );
            let response = match &quote.blocked {
                Some(reason) => response.on_disabled_hover_text(reason.to_string()),
                None => response,
            };
            if response.clicked() {
                chosen = Some(quote.mode);
            }
        }
        if let Some(mode) = chosen {
            self.select_mode(mode);
        }
    }
}

fn parse_field(text: &str) -> Result<Coordinate, String> {
    if text.trim().is_empty() {
        return Err(String::new());
    }
    Coordinate::parse(text)
}
