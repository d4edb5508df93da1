use super::SchedulerApp;
use crate::services::session::dispatch::GatewayRequest;
use crate::utils::date::WeekWindow;

impl SchedulerApp {
    pub(super) fn navigate_previous(&mut self) {
        self.canvas.navigate(-1, &mut self.board);
        self.after_navigation();
    }

    pub(super) fn navigate_next(&mut self) {
        self.canvas.navigate(1, &mut self.board);
        self.after_navigation();
    }

    pub(super) fn jump_to_today(&mut self) {
        let before = self.canvas.week();
        if self.canvas.set_week(WeekWindow::today(), &mut self.board) != before {
            self.after_navigation();
        }
    }

    fn after_navigation(&mut self) {
        self.session_panel = None;
        self.reload_week();
    }

    /// Ask the gateway for every session in the displayed week.
    pub(super) fn reload_week(&mut self) {
        let week = self.canvas.week();
        let ticket = self.board.begin_load();
        self.dispatch(
            ticket,
            GatewayRequest::ListRange {
                from: week.monday(),
                to: week.sunday(),
            },
        );
    }
}
