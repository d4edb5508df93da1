//! Error taxonomy shared by the scheduling services and the time grid.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulingError {
    /// Bad input caught before any state mutation or network call
    #[error("invalid input: {0}")]
    Validation(String),

    /// Distance exceeds the travel policy; only the at-client mode is blocked
    #[error("{distance_km:.1} km is beyond the {max_km:.1} km travel limit")]
    OutOfRange { distance_km: f64, max_km: f64 },

    /// Availability check reported the slot as taken
    #[error("slot unavailable: {reason}")]
    Conflict { reason: String },

    /// Create/update/delete/lookup call failed or was rejected
    #[error("request failed: {0}")]
    Network(String),

    /// The sequencer walked its whole horizon without filling the quota
    #[error(
        "could not place {requested} sessions within {horizon_days} days (placed {emitted})"
    )]
    IterationCapExceeded {
        horizon_days: u32,
        emitted: u32,
        requested: u32,
    },
}

impl SchedulingError {
    /// Validation and range errors are recovered by re-prompting the user.
    pub fn is_recoverable_locally(&self) -> bool {
        matches!(
            self,
            SchedulingError::Validation(_) | SchedulingError::OutOfRange { .. }
        )
    }

    /// Wrap an `anyhow` failure from a storage or HTTP layer.
    pub fn network(err: anyhow::Error) -> Self {
        SchedulingError::Network(format!("{:#}", err))
    }
}

impl From<String> for SchedulingError {
    fn from(message: String) -> Self {
        SchedulingError::Validation(message)
    }
}

pub type SchedulingResult<T> = std::result::Result<T, SchedulingError>;
