mod lifecycle;
mod navigation;
mod replies;
mod toast;

use std::time::Duration;

use tokio::runtime::Runtime;

use self::toast::ToastManager;
use crate::models::settings::Settings;
use crate::services::session::board::{SessionBoard, Ticket};
use crate::services::session::dispatch::{GatewayDispatcher, GatewayRequest};
use crate::services::travel::debounce::LookupDebouncer;
use crate::ui_egui::planner_panel::{PlannerAction, PlannerPanel};
use crate::ui_egui::session_panel::{PanelAction, SessionPanel};
use crate::ui_egui::time_grid::{CanvasAction, TimeGridCanvas};
use crate::ui_egui::travel_panel::{LookupState, TravelPanel};

const SIDE_PANEL_DEFAULT_WIDTH: f32 = 320.0;
const SIDE_PANEL_MIN_WIDTH: f32 = 260.0;
const SIDE_PANEL_MAX_WIDTH: f32 = 480.0;

pub struct SchedulerApp {
    settings: Settings,
    board: SessionBoard,
    canvas: TimeGridCanvas,
    dispatcher: GatewayDispatcher,
    debouncer: LookupDebouncer,
    /// Detail editor for the selected block
    session_panel: Option<SessionPanel>,
    planner: PlannerPanel,
    travel: TravelPanel,
    toasts: ToastManager,
    /// Only the newest preview/availability answer is shown
    latest_preview: Option<Ticket>,
    latest_availability: Option<Ticket>,
    runtime: Runtime,
}

impl eframe::App for SchedulerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_replies();
        self.travel.poll(&mut self.debouncer);

        self.show_top_bar(ctx);
        self.show_side_panel(ctx);
        egui::TopBottomPanel::bottom("travel_panel")
            .resizable(false)
            .show(ctx, |ui| self.travel.show(ui, &mut self.debouncer));
        self.show_grid(ctx);
        self.toasts.render(ctx);

        if self.dispatcher.in_flight() > 0
            || matches!(self.travel.lookup_state(), LookupState::Waiting(_))
        {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}

impl SchedulerApp {
    fn dispatch(&mut self, ticket: Ticket, request: GatewayRequest) {
        self.dispatcher.dispatch(ticket, request);
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("week_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("◀").on_hover_text("Previous week").clicked() {
                    self.navigate_previous();
                }
                if ui.button("Today").clicked() {
                    self.jump_to_today();
                }
                if ui.button("▶").on_hover_text("Next week").clicked() {
                    self.navigate_next();
                }
                ui.separator();
                ui.strong(self.canvas.week().label());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let pending = self.board.pending_count();
                    if pending > 0 {
                        ui.spinner();
                        ui.label(format!("{} pending", pending));
                    }
                });
            });
        });
    }

    fn show_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("planner_side_panel")
            .resizable(true)
            .default_width(SIDE_PANEL_DEFAULT_WIDTH)
            .min_width(SIDE_PANEL_MIN_WIDTH)
            .max_width(SIDE_PANEL_MAX_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.show_session_panel(ui);
                    ui.separator();
                    if let Some(action) = self.planner.show(ui) {
                        self.handle_planner_action(action);
                    }
                });
            });
    }

    fn show_session_panel(&mut self, ui: &mut egui::Ui) {
        let Some(panel) = self.session_panel.as_mut() else {
            ui.label(egui::RichText::new("Click a session to edit it").weak());
            return;
        };
        let Some(block) = self.board.block(panel.session_id()).cloned() else {
            // Deleted or rolled back out from under the panel
            self.session_panel = None;
            return;
        };
        if let Some(action) = panel.show(ui, &block) {
            self.handle_panel_action(action);
        }
    }

    fn show_grid(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let actions = self.canvas.show(ui, &mut self.board);
            for action in actions {
                self.handle_canvas_action(action);
            }
        });
    }

    fn handle_canvas_action(&mut self, action: CanvasAction) {
        match action {
            CanvasAction::Select(id) => {
                self.session_panel = self.board.block(id).map(SessionPanel::open);
            }
            CanvasAction::Commit { ticket, request } => self.dispatch(ticket, request),
            CanvasAction::Rejected(error) => self.toasts.error("Change not applied", &error),
        }
    }

    fn handle_panel_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::Save { id, patch } => match self.board.begin_update(id, &patch) {
                Ok(ticket) => self.dispatch(ticket, GatewayRequest::Update { id, patch }),
                Err(error) => self.toasts.error("Could not save", &error),
            },
            PanelAction::Delete(id) => match self.board.begin_delete(id) {
                Ok(ticket) => {
                    self.session_panel = None;
                    self.canvas.select(None);
                    self.dispatch(ticket, GatewayRequest::Delete(id));
                }
                Err(error) => self.toasts.error("Could not delete", &error),
            },
            PanelAction::Close => {
                self.session_panel = None;
                self.canvas.select(None);
            }
        }
    }

    fn handle_planner_action(&mut self, action: PlannerAction) {
        match action {
            PlannerAction::CheckAvailability {
                patterns,
                package_id,
                from,
            } => {
                let ticket = self.board.next_ticket();
                self.latest_availability = Some(ticket);
                self.dispatch(
                    ticket,
                    GatewayRequest::CheckAvailability {
                        patterns,
                        package_id,
                        from,
                    },
                );
            }
            PlannerAction::Preview { spec, times } => {
                let ticket = self.board.next_ticket();
                self.latest_preview = Some(ticket);
                self.dispatch(ticket, GatewayRequest::Preview { spec, times });
            }
            PlannerAction::Book(requests) => {
                let total = requests.len();
                let mut sent = 0;
                for request in requests {
                    match self.board.begin_create(&request) {
                        Ok((ticket, _)) => {
                            self.dispatch(ticket, GatewayRequest::Create(request));
                            sent += 1;
                        }
                        Err(error) => self.toasts.error("Could not book", &error),
                    }
                }
                log::info!("Booking {} of {} planned sessions", sent, total);
                if sent > 0 {
                    self.toasts.success(format!("Booking {} sessions", sent));
                }
            }
        }
    }
}
