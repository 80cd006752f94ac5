use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::search::FlightLeg;

/// A single lookup against the flight-data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FareQuery {
    pub origin: String,
    /// Restrict arrivals to one airport (used when fetching the way home)
    pub destination: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl FareQuery {
    pub fn new(origin: impl Into<String>, date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            origin: origin.into(),
            destination: None,
            date_from,
            date_to,
        }
    }

    pub fn to_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider transport failure: {0}")]
    Transport(String),
    #[error("Provider request timed out")]
    Timeout,
    #[error("Provider returned status {0}")]
    Status(u16),
    #[error("Provider response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait FlightProvider: Send + Sync {
    /// Return every leg departing `query.origin` between the two dates (inclusive)
    async fn fetch(&self, query: &FareQuery) -> Result<Vec<FlightLeg>, ProviderError>;
}
