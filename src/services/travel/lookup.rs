//! Distance/duration lookups against an OSRM-compatible routing service.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::models::travel::{Coordinate, RouteEstimate};

/// Source of road distance between two points
pub trait RouteLookup: Send + Sync {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteEstimate>;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// metres
    distance: f64,
    /// seconds
    duration: f64,
}

pub struct OsrmRouteLookup {
    client: Client,
    base_url: String,
}

impl OsrmRouteLookup {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(anyhow!("Route service URL must use HTTP(S)"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build route lookup HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        // OSRM expects lon,lat pairs
        format!(
            "{}/route/v1/driving/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.base_url, origin.lon, origin.lat, destination.lon, destination.lat
        )
    }

    fn parse_body(body: &str) -> Result<RouteEstimate> {
        let response: OsrmResponse =
            serde_json::from_str(body).context("Route response is not valid JSON")?;

        if response.code != "Ok" {
            return Err(anyhow!(
                "Route service returned {}: {}",
                response.code,
                response.message.unwrap_or_default()
            ));
        }

        let route = response
            .routes
            .first()
            .ok_or_else(|| anyhow!("Route service returned no routes"))?;

        Ok(RouteEstimate {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
        })
    }
}

impl RouteLookup for OsrmRouteLookup {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteEstimate> {
        let url = self.route_url(origin, destination);
        let response = self
            .client
            .get(&url)
            .send()
            .context("Network error during route lookup")?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(anyhow!("Route lookup failed with HTTP status {}", status));
        }

        let body = response
            .text()
            .context("Failed to read route response body")?;
        Self::parse_body(&body)
    }
}
