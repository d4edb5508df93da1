// Coach Planner
// Desktop entry point

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
#[cfg(not(debug_assertions))]
use directories::ProjectDirs;

use coach_planner::services::session::LocalSessionStore;
use coach_planner::services::settings::SettingsService;
use coach_planner::services::travel::lookup::OsrmRouteLookup;
use coach_planner::ui_egui::SchedulerApp;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Starting Coach Planner");

    let settings_service = SettingsService::from_default_location();
    let settings = settings_service.load();

    let db_path = database_path()?;
    log::info!("Using session database at {}", db_path);
    let store = LocalSessionStore::open(&db_path)?.configured(&settings);
    let lookup = OsrmRouteLookup::new(settings.travel.route_service_url.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("coach-planner-worker")
        .build()
        .context("Failed to start background runtime")?;

    let app = SchedulerApp::new(runtime, settings, Arc::new(store), Arc::new(lookup));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Coach Planner")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Coach Planner",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("UI event loop failed: {}", e))
}

#[cfg(debug_assertions)]
fn database_path() -> Result<String> {
    Ok("sessions.db".to_string())
}

#[cfg(not(debug_assertions))]
fn database_path() -> Result<String> {
    match ProjectDirs::from("com", "CoachPlanner", "CoachPlanner") {
        Some(dirs) => {
            let data_dir = dirs.data_dir();
            std::fs::create_dir_all(data_dir)
                .with_context(|| format!("Failed to create {}", data_dir.display()))?;
            Ok(data_dir.join("sessions.db").to_string_lossy().to_string())
        }
        None => Ok("sessions.db".to_string()),
    }
}
