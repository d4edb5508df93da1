//! Travel fee calculation and booking-mode gating for at-client sessions.

pub mod debounce;
pub mod lookup;

use crate::models::travel::{BookingMode, Coordinate, RouteEstimate, TravelPolicy};
use crate::services::error::{SchedulingError, SchedulingResult};

/// Fee in whole currency units for travelling `distance_km`.
///
/// Distances inside the free radius cost nothing; distances beyond
/// `max_travel_km` are rejected with [`SchedulingError::OutOfRange`].
///
/// ```
/// use coach_planner::models::travel::TravelPolicy;
/// use coach_planner::services::travel::compute_fee;
///
/// let policy = TravelPolicy::new(6.0, 10.0, 10_000.0).unwrap();
/// assert_eq!(compute_fee(8.0, &policy).unwrap(), 20_000);
/// assert!(compute_fee(12.0, &policy).is_err());
/// ```
pub fn compute_fee(distance_km: f64, policy: &TravelPolicy) -> SchedulingResult<u64> {
    policy.validate()?;
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(SchedulingError::Validation(format!(
            "Distance {} km is not a valid measurement",
            distance_km
        )));
    }
    if distance_km > policy.max_travel_km {
        return Err(SchedulingError::OutOfRange {
            distance_km,
            max_km: policy.max_travel_km,
        });
    }

    let billable_km = (distance_km - policy.free_radius_km).max(0.0);
    Ok((billable_km * policy.fee_per_km).round() as u64)
}

/// Outcome of a route lookup as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Route(RouteEstimate),
    /// Lookup failed; only the two markers can be drawn
    PointsOnly {
        origin: Coordinate,
        destination: Coordinate,
        reason: String,
    },
}

impl RouteOutcome {
    pub fn distance_km(&self) -> Option<f64> {
        match self {
            RouteOutcome::Route(estimate) => Some(estimate.distance_km),
            RouteOutcome::PointsOnly { .. } => None,
        }
    }
}

/// Bookability of one mode, with the travel fee where one applies
#[derive(Debug, Clone, PartialEq)]
pub struct ModeQuote {
    pub mode: BookingMode,
    pub fee: u64,
    pub blocked: Option<SchedulingError>,
}

impl ModeQuote {
    pub fn is_selectable(&self) -> bool {
        self.blocked.is_none()
    }
}

/// Quote every booking mode. Only [`BookingMode::AtClient`] depends on the
/// route; it is blocked when out of range or when no distance is known.
pub fn quote_modes(route: &RouteOutcome, policy: &TravelPolicy) -> Vec<ModeQuote> {
    BookingMode::ALL
        .iter()
        .map(|mode| match mode {
            BookingMode::AtClient => {
                let fee = match route {
                    RouteOutcome::Route(estimate) => compute_fee(estimate.distance_km, policy),
                    RouteOutcome::PointsOnly { reason, .. } => {
                        Err(SchedulingError::Network(reason.clone()))
                    }
                };
                match fee {
                    Ok(fee) => ModeQuote {
                        mode: *mode,
                        fee,
                        blocked: None,
                    },
                    Err(err) => ModeQuote {
                        mode: *mode,
                        fee: 0,
                        blocked: Some(err),
                    },
                }
            }
            _ => ModeQuote {
                mode: *mode,
                fee: 0,
                blocked: None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn policy() -> TravelPolicy {
        TravelPolicy::new(6.0, 10.0, 10_000.0).unwrap()
    }

    #[test_case(0.0, 0; "at the coach")]
    #[test_case(6.0, 0; "edge of free radius")]
    #[test_case(6.5, 5_000; "half a billable km")]
    #[test_case(8.0, 20_000; "two billable km")]
    #[test_case(10.0, 40_000; "exactly max distance")]
    fn test_fee_tiers(distance: f64, expected: u64) {
        assert_eq!(compute_fee(distance, &policy()).unwrap(), expected);
    }

    #[test]
    fn test_beyond_max_is_out_of_range() {
        assert_eq!(
            compute_fee(12.0, &policy()).unwrap_err(),
            SchedulingError::OutOfRange {
                distance_km: 12.0,
                max_km: 10.0
            }
        );
        assert!(compute_fee(10.0001, &policy()).is_err());
    }

    #[test]
    fn test_fee_rounds_to_nearest_unit() {
        let policy = TravelPolicy::new(0.0, 50.0, 3.0).unwrap();
        // 1.25 km * 3 = 3.75
        assert_eq!(compute_fee(1.25, &policy).unwrap(), 4);
        // 1.1 km * 3 = 3.3
        assert_eq!(compute_fee(1.1, &policy).unwrap(), 3);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            compute_fee(-1.0, &policy()),
            Err(SchedulingError::Validation(_))
        ));
        assert!(matches!(
            compute_fee(f64::NAN, &policy()),
            Err(SchedulingError::Validation(_))
        ));
        let broken = TravelPolicy {
            free_radius_km: 5.0,
            max_travel_km: 1.0,
            fee_per_km: 1.0,
        };
        assert!(matches!(
            compute_fee(0.5, &broken),
            Err(SchedulingError::Validation(_))
        ));
    }

    #[test]
    fn test_out_of_range_blocks_only_at_client() {
        let route = RouteOutcome::Route(RouteEstimate {
            distance_km: 12.0,
            duration_min: 25.0,
        });
        let quotes = quote_modes(&route, &policy());
        assert_eq!(quotes.len(), 3);
        for quote in &quotes {
            match quote.mode {
                BookingMode::AtClient => assert!(matches!(
                    quote.blocked,
                    Some(SchedulingError::OutOfRange { .. })
                )),
                _ => assert!(quote.is_selectable()),
            }
        }
    }

    #[test]
    fn test_in_range_quotes_fee() {
        let route = RouteOutcome::Route(RouteEstimate {
            distance_km: 8.0,
            duration_min: 15.0,
        });
        let quote = quote_modes(&route, &policy())
            .into_iter()
            .find(|q| q.mode == BookingMode::AtClient)
            .unwrap();
        assert!(quote.is_selectable());
        assert_eq!(quote.fee, 20_000);
    }

    #[test]
    fn test_points_only_blocks_at_client() {
        let point = Coordinate::new(0.0, 0.0).unwrap();
        let route = RouteOutcome::PointsOnly {
            origin: point,
            destination: point,
            reason: "timeout".to_string(),
        };
        assert_eq!(route.distance_km(), None);
        let quotes = quote_modes(&route, &policy());
        let at_client = quotes.iter().find(|q| q.mode == BookingMode::AtClient).unwrap();
        assert_eq!(
            at_client.blocked,
            Some(SchedulingError::Network("timeout".to_string()))
        );
        assert!(quotes
            .iter()
            .filter(|q| q.mode != BookingMode::AtClient)
            .all(ModeQuote::is_selectable));
    }
}
