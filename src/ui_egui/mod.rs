mod app;
pub mod drag;
pub mod planner_panel;
pub mod resize;
pub mod session_panel;
pub mod time_grid;
pub mod time_scale;
pub mod travel_panel;

pub use app::SchedulerApp;
