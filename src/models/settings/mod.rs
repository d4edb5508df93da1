// Settings module
// User-editable configuration persisted as TOML

use serde::{Deserialize, Serialize};

use crate::models::recurrence::QuotaPolicy;
use crate::models::travel::TravelPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub grid: GridSettings,
    pub scheduling: SchedulingSettings,
    pub travel: TravelSettings,
}

/// Visible window and snapping of the weekly time grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub visible_start_hour: u32,
    pub visible_end_hour: u32,
    pub step_minutes: u32,
    pub default_session_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingSettings {
    pub max_horizon_days: u32,
    pub quota_policy: QuotaPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelSettings {
    pub free_radius_km: f64,
    pub max_travel_km: f64,
    pub fee_per_km: f64,
    pub lookup_debounce_ms: u64,
    pub route_service_url: String,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible_start_hour: 6,
            visible_end_hour: 22,
            step_minutes: 30,
            default_session_minutes: 60,
        }
    }
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            max_horizon_days: 3660,
            quota_policy: QuotaPolicy::Shared,
        }
    }
}

impl Default for TravelSettings {
    fn default() -> Self {
        let policy = TravelPolicy::default();
        Self {
            free_radius_km: policy.free_radius_km,
            max_travel_km: policy.max_travel_km,
            fee_per_km: policy.fee_per_km,
            lookup_debounce_ms: 300,
            route_service_url: "https://router.project-osrm.org".to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        let grid = &self.grid;
        if grid.visible_end_hour > 24 {
            return Err("Visible end hour cannot be after 24".to_string());
        }
        if grid.visible_start_hour >= grid.visible_end_hour {
            return Err("Visible start hour must be before the end hour".to_string());
        }
        if grid.step_minutes == 0 || grid.step_minutes > 240 {
            return Err("Step must be between 1 and 240 minutes".to_string());
        }
        if grid.default_session_minutes < grid.step_minutes {
            return Err("Default session length must be at least one step".to_string());
        }
        if self.scheduling.max_horizon_days == 0 {
            return Err("Scheduling horizon must be at least one day".to_string());
        }
        if !self.travel.route_service_url.starts_with("http") {
            return Err("Route service URL must be an http(s) URL".to_string());
        }
        self.travel_policy().validate()
    }

    pub fn travel_policy(&self) -> TravelPolicy {
        TravelPolicy {
            free_radius_km: self.travel.free_radius_km,
            max_travel_km: self.travel.max_travel_km,
            fee_per_km: self.travel.fee_per_km,
        }
    }

    pub fn visible_start_minute(&self) -> u32 {
        self.grid.visible_start_hour * 60
    }

    pub fn visible_end_minute(&self) -> u32 {
        self.grid.visible_end_hour * 60
    }
}
