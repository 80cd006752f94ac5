use axum::{
    extract::{Query, RawQuery, State},
    middleware,
    response::{
        sse::{Event, KeepAlive, Sse},
        Redirect,
    },
    routing::get,
    Router,
};
use chrono::NaiveDate;
use faresweep_core::{
    FareQuery, FlightLeg, FlightProvider, PassengerCounts, SearchConstraints, TripType,
};
use faresweep_engine::rules::{LegRole, TripRules};
use faresweep_engine::{ChannelSink, CombinationEngine, EventSink, StreamOutcome, StreamingCoordinator};
use futures_util::future::join_all;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::rate_limit_middleware;
use crate::state::AppState;

/// Events buffered between the coordinator and the HTTP body.
const EVENT_BUFFER: usize = 16;

pub fn routes(state: AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/api/search-flights", get(search_flights))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware));

    Router::new()
        .merge(limited)
        .route("/search-flights", get(legacy_redirect))
}

/// Raw query string, everything optional so validation can report precise errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFlightsQuery {
    pub trip_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_price: Option<String>,
    pub min_days: Option<String>,
    pub max_days: Option<String>,
    pub origin_airports: Option<String>,
    pub wanted_countries: Option<String>,
    pub adults: Option<String>,
    pub teens: Option<String>,
    pub children: Option<String>,
    pub infants: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: &Option<String>) -> Result<Option<NaiveDate>, AppError> {
    present(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
                AppError::ValidationError(format!("Invalid date format for {}. Use YYYY-MM-DD", field))
            })
        })
        .transpose()
}

fn parse_number<T: FromStr>(field: &str, value: &Option<String>) -> Result<Option<T>, AppError> {
    present(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| AppError::ValidationError(format!("Invalid numeric value for {}", field)))
        })
        .transpose()
}

fn split_list(value: &Option<String>) -> Vec<String> {
    present(value)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_airport_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

impl SearchFlightsQuery {
    pub fn into_constraints(self) -> Result<SearchConstraints, AppError> {
        let trip_type = present(&self.trip_type)
            .ok_or_else(|| AppError::ValidationError("Missing required field: tripType".to_string()))?;
        let trip_type = TripType::from_str(trip_type).map_err(|e| AppError::ValidationError(e.to_string()))?;

        let start_date = parse_date("startDate", &self.start_date)?
            .ok_or_else(|| AppError::ValidationError("Missing required field: startDate".to_string()))?;
        let end_date = parse_date("endDate", &self.end_date)?;

        let max_price: Option<f64> = parse_number("maxPrice", &self.max_price)?;
        if max_price.is_some_and(|p| !p.is_finite() || p < 0.0) {
            return Err(AppError::ValidationError("Invalid numeric value for maxPrice".to_string()));
        }

        let origin_airports = split_list(&self.origin_airports);
        if origin_airports.is_empty() {
            return Err(AppError::ValidationError("Origin airports cannot be empty".to_string()));
        }
        if let Some(bad) = origin_airports.iter().find(|c| !is_airport_code(c)) {
            return Err(AppError::ValidationError(format!("Invalid airport code: {}", bad)));
        }

        let passengers = PassengerCounts {
            adults: parse_number("adults", &self.adults)?.unwrap_or(0),
            teens: parse_number("teens", &self.teens)?.unwrap_or(0),
            children: parse_number("children", &self.children)?.unwrap_or(0),
            infants: parse_number("infants", &self.infants)?.unwrap_or(0),
        };

        let constraints = SearchConstraints {
            trip_type,
            start_date,
            end_date,
            max_price,
            min_days: parse_number("minDays", &self.min_days)?,
            max_days: parse_number("maxDays", &self.max_days)?,
            origin_airports,
            wanted_countries: split_list(&self.wanted_countries),
            passengers,
        };

        constraints
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        Ok(constraints)
    }
}

async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<SearchFlightsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let constraints = query.into_constraints()?;

    let search_id = Uuid::new_v4();
    let span = tracing::info_span!("search", %search_id);
    span.in_scope(|| info!("Search request received: {:?}", constraints));

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let provider = state.provider.clone();
    let pacing = state.pacing;

    tokio::spawn(
        async move {
            let mut sink = ChannelSink::new(tx);
            let outcome = run_search(provider.as_ref(), &constraints, pacing, &mut sink).await;
            info!(
                "Search finished: {} events, client disconnected: {}",
                outcome.emitted, outcome.disconnected
            );
        }
        .instrument(span),
    );

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn legacy_redirect(RawQuery(query): RawQuery) -> Redirect {
    let target = match query {
        Some(q) if !q.is_empty() => format!("/api/search-flights?{}", q),
        _ => "/api/search-flights".to_string(),
    };
    Redirect::temporary(&target)
}

/// Fetch legs, pair them and stream the results into `sink`.
pub async fn run_search<S: EventSink>(
    provider: &dyn FlightProvider,
    constraints: &SearchConstraints,
    pacing: Duration,
    sink: &mut S,
) -> StreamOutcome {
    let outbound = fetch_outbound(provider, constraints).await;
    let inbound = if constraints.trip_type.has_inbound() {
        Some(fetch_inbound(provider, constraints, &outbound).await)
    } else {
        None
    };

    let source = CombinationEngine::new(constraints).generate(&outbound, inbound.as_deref());
    StreamingCoordinator::new(pacing).run(source, sink).await
}

async fn fetch_outbound(provider: &dyn FlightProvider, constraints: &SearchConstraints) -> Vec<FlightLeg> {
    let (from, to) = constraints.outbound_window();
    let queries = constraints
        .origin_airports
        .iter()
        .map(|origin| FareQuery::new(origin.clone(), from, to))
        .collect();
    fetch_all(provider, queries).await
}

/// One lookup per distinct destination the outbound legs reach.
async fn fetch_inbound(
    provider: &dyn FlightProvider,
    constraints: &SearchConstraints,
    outbound: &[FlightLeg],
) -> Vec<FlightLeg> {
    let rules = TripRules::new(constraints, LegRole::Outbound);
    let destinations: BTreeSet<&str> = outbound
        .iter()
        .filter(|leg| rules.accepts(leg))
        .map(|leg| leg.destination.as_str())
        .collect();

    let (from, to) = constraints.inbound_window();
    let single_home = match constraints.origin_airports.as_slice() {
        [home] => Some(home.clone()),
        _ => None,
    };

    let queries = destinations
        .into_iter()
        .map(|destination| {
            let query = FareQuery::new(destination, from, to);
            match &single_home {
                Some(home) => query.to_destination(home.clone()),
                None => query,
            }
        })
        .collect();
    fetch_all(provider, queries).await
}

async fn fetch_all(provider: &dyn FlightProvider, queries: Vec<FareQuery>) -> Vec<FlightLeg> {
    let results = join_all(queries.iter().map(|q| provider.fetch(q))).await;

    let mut legs = Vec::new();
    for (query, result) in queries.iter().zip(results) {
        match result {
            Ok(found) => {
                info!("Found {} legs from {}", found.len(), query.origin);
                legs.extend(found);
            }
            Err(e) => warn!("Provider lookup from {} failed: {}", query.origin, e),
        }
    }
    legs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> SearchFlightsQuery {
        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/api/search-flights?{}", encoded).parse().unwrap();
        Query::<SearchFlightsQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_weekend_query_into_constraints() {
        let constraints = query(&[
            ("tripType", "weekend"),
            ("startDate", "2024-03-15"),
            ("endDate", "2024-03-17"),
            ("maxPrice", "100"),
            ("originAirports", "DUB,ORK"),
            ("wantedCountries", "Spain,Italy"),
            ("adults", "1"),
            ("children", "1"),
        ])
        .into_constraints()
        .unwrap();

        assert_eq!(constraints.trip_type, TripType::Weekend);
        assert_eq!(constraints.max_price, Some(100.0));
        assert_eq!(constraints.origin_airports, vec!["DUB", "ORK"]);
        assert_eq!(constraints.wanted_countries, vec!["Spain", "Italy"]);
        assert_eq!(constraints.passengers.total(), 2);
    }

    #[test]
    fn test_rejects_bad_input() {
        let base = [
            ("tripType", "oneWay"),
            ("startDate", "2024-03-15"),
            ("originAirports", "DUB"),
            ("adults", "1"),
        ];
        assert!(query(&base).into_constraints().is_ok());

        let mut bad_date = base;
        bad_date[1] = ("startDate", "15/03/2024");
        assert!(query(&bad_date).into_constraints().is_err());

        let mut bad_code = base;
        bad_code[2] = ("originAirports", "dub");
        assert!(query(&bad_code).into_constraints().is_err());

        let mut no_adults = base;
        no_adults[3] = ("adults", "0");
        assert!(query(&no_adults).into_constraints().is_err());

        let mut negative = base;
        negative[3] = ("adults", "-1");
        assert!(query(&negative).into_constraints().is_err());

        let mut overflow = base;
        overflow[3] = ("adults", "4294967295");
        let mut overflow = overflow.to_vec();
        overflow.push(("children", "1"));
        overflow.push(("maxPrice", "10"));
        assert!(query(&overflow).into_constraints().is_err());

        let mut party_of_ten = base;
        party_of_ten[3] = ("adults", "10");
        assert!(query(&party_of_ten).into_constraints().is_err());

        let mut return_trip = base;
        return_trip[0] = ("tripType", "return");
        assert!(query(&return_trip).into_constraints().is_err());
    }

    #[test]
    fn test_airport_code_shape() {
        assert!(is_airport_code("DUB"));
        assert!(!is_airport_code("DU"));
        assert!(!is_airport_code("Dub"));
        assert!(!is_airport_code("DUBL"));
    }
}
