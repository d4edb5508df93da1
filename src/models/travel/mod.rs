// Travel module
// Travel policy, coordinates and booking modes for at-client sessions

use serde::{Deserialize, Serialize};

/// Free-radius / max-distance / per-km fee rule set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelPolicy {
    pub free_radius_km: f64,
    pub max_travel_km: f64,
    /// Fee per kilometre beyond the free radius, in currency units
    pub fee_per_km: f64,
}

impl TravelPolicy {
    pub fn new(free_radius_km: f64, max_travel_km: f64, fee_per_km: f64) -> Result<Self, String> {
        let policy = Self {
            free_radius_km,
            max_travel_km,
            fee_per_km,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.free_radius_km.is_finite() || self.free_radius_km < 0.0 {
            return Err("Free radius must be zero or more kilometres".to_string());
        }
        if !self.max_travel_km.is_finite() || self.max_travel_km < self.free_radius_km {
            return Err("Maximum travel distance cannot be below the free radius".to_string());
        }
        if !self.fee_per_km.is_finite() || self.fee_per_km < 0.0 {
            return Err("Fee per kilometre cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for TravelPolicy {
    fn default() -> Self {
        Self {
            free_radius_km: 6.0,
            max_travel_km: 10.0,
            fee_per_km: 10_000.0,
        }
    }
}

/// WGS84 point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, String> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(format!("Latitude {} is outside [-90, 90]", lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(format!("Longitude {} is outside [-180, 180]", lon));
        }
        Ok(Self { lat, lon })
    }

    /// Parse `"lat, lon"` as typed into a text field.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut parts = input.split(',').map(str::trim);
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err("Expected coordinates as \"lat, lon\"".to_string());
        };
        let lat: f64 = lat
            .parse()
            .map_err(|_| format!("Latitude '{}' is not a number", lat))?;
        let lon: f64 = lon
            .parse()
            .map_err(|_| format!("Longitude '{}' is not a number", lon))?;
        Self::new(lat, lon)
    }
}

/// Result of a distance/duration lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Where a session takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingMode {
    AtCoach,
    AtClient,
    Online,
}

impl BookingMode {
    pub const ALL: [BookingMode; 3] = [BookingMode::AtCoach, BookingMode::AtClient, BookingMode::Online];

    pub fn label(&self) -> &'static str {
        match self {
            BookingMode::AtCoach => "At coach's location",
            BookingMode::AtClient => "At client's location",
            BookingMode::Online => "Online",
        }
    }
}
