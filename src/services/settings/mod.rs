// Settings service module
// Loads and saves the TOML configuration file

mod service;

pub use service::{default_config_path, SettingsService, SETTINGS_FILE_NAME};
