pub mod search;
pub mod provider;

pub use search::{FlightLeg, PassengerCounts, SearchConstraints, TripType, MAX_PASSENGERS};
pub use provider::{FareQuery, FlightProvider, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid search constraints: {0}")]
    InvalidConstraints(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
