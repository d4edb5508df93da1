use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;

use super::toast::ToastManager;
use super::SchedulerApp;
use crate::models::settings::Settings;
use crate::services::schedule::SlotSequencer;
use crate::services::session::board::SessionBoard;
use crate::services::session::dispatch::GatewayDispatcher;
use crate::services::session::SessionGateway;
use crate::services::travel::debounce::LookupDebouncer;
use crate::services::travel::lookup::RouteLookup;
use crate::ui_egui::planner_panel::PlannerPanel;
use crate::ui_egui::time_grid::TimeGridCanvas;
use crate::ui_egui::travel_panel::TravelPanel;
use crate::utils::date::WeekWindow;

impl SchedulerApp {
    /// Build the app around a gateway and route lookup, and request the
    /// current week.
    pub fn new(
        runtime: Runtime,
        settings: Settings,
        gateway: Arc<dyn SessionGateway>,
        lookup: Arc<dyn RouteLookup>,
    ) -> Self {
        log::info!(
            "Grid {}:00-{}:00 in {}-minute steps",
            settings.grid.visible_start_hour,
            settings.grid.visible_end_hour,
            settings.grid.step_minutes
        );

        let handle = runtime.handle().clone();
        let dispatcher = GatewayDispatcher::new(handle.clone(), gateway);
        let debouncer = LookupDebouncer::new(
            handle,
            lookup,
            Duration::from_millis(settings.travel.lookup_debounce_ms),
        );
        let planner = PlannerPanel::new(
            SlotSequencer::with_horizon(settings.scheduling.max_horizon_days),
            settings.scheduling.quota_policy,
            settings.grid.default_session_minutes,
        );

        let mut app = Self {
            board: SessionBoard::new(),
            canvas: TimeGridCanvas::new(WeekWindow::today(), &settings.grid),
            dispatcher,
            debouncer,
            session_panel: None,
            planner,
            travel: TravelPanel::new(settings.travel_policy()),
            toasts: ToastManager::new(),
            latest_preview: None,
            latest_availability: None,
            settings,
            runtime,
        };
        app.reload_week();
        app
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Spawned work stays on this runtime for the app's lifetime.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}
