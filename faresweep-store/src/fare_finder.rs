use async_trait::async_trait;
use chrono::NaiveDateTime;
use faresweep_core::{FareQuery, FlightLeg, FlightProvider, ProviderError};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::app_config::ProviderConfig;

const ONE_WAY_FARES_PATH: &str = "/farfnd/v4/oneWayFares";

/// Client for the public low-fare finder API.
#[derive(Clone)]
pub struct FareFinderClient {
    http: reqwest::Client,
    base_url: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct FaresResponse {
    #[serde(default)]
    fares: Vec<Fare>,
}

#[derive(Debug, Deserialize)]
struct Fare {
    outbound: FareLeg,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FareLeg {
    departure_airport: FareAirport,
    arrival_airport: FareAirport,
    departure_date: NaiveDateTime,
    #[serde(default)]
    flight_number: Option<String>,
    price: FarePrice,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FareAirport {
    iata_code: String,
    name: String,
    country_name: String,
}

impl FareAirport {
    fn full_name(&self) -> String {
        format!("{}, {}", self.name, self.country_name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FarePrice {
    value: f64,
    currency_code: String,
}

impl From<FareLeg> for FlightLeg {
    fn from(leg: FareLeg) -> Self {
        FlightLeg {
            origin_full: leg.departure_airport.full_name(),
            destination_full: leg.arrival_airport.full_name(),
            origin: leg.departure_airport.iata_code,
            destination: leg.arrival_airport.iata_code,
            departure_time: leg.departure_date,
            price: leg.price.value,
            flight_number: leg.flight_number,
            currency: Some(leg.price.currency_code),
        }
    }
}

impl FareFinderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            currency: config.currency.clone(),
        })
    }

    fn query_params(&self, query: &FareQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("departureAirportIataCode", query.origin.clone()),
            ("outboundDepartureDateFrom", query.date_from.format("%Y-%m-%d").to_string()),
            ("outboundDepartureDateTo", query.date_to.format("%Y-%m-%d").to_string()),
            ("currency", self.currency.clone()),
        ];
        if let Some(destination) = &query.destination {
            params.push(("arrivalAirportIataCode", destination.clone()));
        }
        params
    }
}

#[async_trait]
impl FlightProvider for FareFinderClient {
    async fn fetch(&self, query: &FareQuery) -> Result<Vec<FlightLeg>, ProviderError> {
        let url = format!("{}{}", self.base_url, ONE_WAY_FARES_PATH);
        debug!("Fetching fares from {} for {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Fare finder returned {} for {}", status, query.origin);
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        parse_fares(&body)
    }
}

fn parse_fares(body: &str) -> Result<Vec<FlightLeg>, ProviderError> {
    let parsed: FaresResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
    Ok(parsed.fares.into_iter().map(|fare| fare.outbound.into()).collect())
}
