use chrono::{Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// One scheduled one-directional flight as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    pub origin: String,
    pub origin_full: String,
    pub destination: String,
    pub destination_full: String,
    pub departure_time: NaiveDateTime,
    /// Per-passenger base fare
    pub price: f64,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl FlightLeg {
    pub fn new(
        origin: impl Into<String>,
        origin_full: impl Into<String>,
        destination: impl Into<String>,
        destination_full: impl Into<String>,
        departure_time: NaiveDateTime,
        price: f64,
    ) -> Self {
        Self {
            origin: origin.into(),
            origin_full: origin_full.into(),
            destination: destination.into(),
            destination_full: destination_full.into(),
            departure_time,
            price,
            flight_number: None,
            currency: None,
        }
    }

    pub fn origin_country(&self) -> &str {
        country_segment(&self.origin_full)
    }

    pub fn destination_country(&self) -> &str {
        country_segment(&self.destination_full)
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_time.date()
    }
}

/// Display names read "Barcelona, Spain"; the country is the last segment.
fn country_segment(full: &str) -> &str {
    full.rsplit(',').next().unwrap_or(full).trim()
}

/// Parsed through `FromStr`, so query strings and serde accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum TripType {
    OneWay,
    Return,
    Weekend,
    LongWeekend,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "oneWay",
            TripType::Return => "return",
            TripType::Weekend => "weekend",
            TripType::LongWeekend => "longWeekend",
        }
    }

    pub fn requires_end_date(&self) -> bool {
        !matches!(self, TripType::OneWay)
    }

    pub fn has_inbound(&self) -> bool {
        self.requires_end_date()
    }

    /// Departure weekday, return weekday and span in days for the weekend trip types
    pub fn fixed_window(&self) -> Option<(Weekday, Weekday, u32)> {
        match self {
            TripType::Weekend => Some((Weekday::Fri, Weekday::Sun, 2)),
            TripType::LongWeekend => Some((Weekday::Thu, Weekday::Mon, 4)),
            TripType::OneWay | TripType::Return => None,
        }
    }
}

impl std::str::FromStr for TripType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oneWay" | "ONE_WAY" | "one_way" => Ok(TripType::OneWay),
            "return" | "RETURN" => Ok(TripType::Return),
            "weekend" | "WEEKEND" => Ok(TripType::Weekend),
            "longWeekend" | "LONG_WEEKEND" | "long_weekend" => Ok(TripType::LongWeekend),
            other => Err(CoreError::InvalidConstraints(format!("Unknown trip type: {}", other))),
        }
    }
}

impl TryFrom<String> for TripType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TripType> for &'static str {
    fn from(trip_type: TripType) -> Self {
        trip_type.as_str()
    }
}

/// Largest party the carrier sells in one booking.
pub const MAX_PASSENGERS: u32 = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerCounts {
    pub adults: u32,
    pub teens: u32,
    pub children: u32,
    pub infants: u32,
}

impl PassengerCounts {
    pub fn adults(adults: u32) -> Self {
        Self { adults, ..Default::default() }
    }

    /// Every category is priced as a full seat. Saturates rather than wraps.
    pub fn total(&self) -> u32 {
        self.adults
            .saturating_add(self.teens)
            .saturating_add(self.children)
            .saturating_add(self.infants)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.adults == 0 && self.teens == 0 {
            return Err(CoreError::InvalidConstraints(
                "At least one adult or teen passenger is required".to_string(),
            ));
        }
        if self.total() > MAX_PASSENGERS {
            return Err(CoreError::InvalidConstraints(format!(
                "At most {} passengers can travel together",
                MAX_PASSENGERS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConstraints {
    pub trip_type: TripType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Budget for the whole party, not per passenger
    pub max_price: Option<f64>,
    pub min_days: Option<u32>,
    pub max_days: Option<u32>,
    pub origin_airports: Vec<String>,
    pub wanted_countries: Vec<String>,
    pub passengers: PassengerCounts,
}

impl SearchConstraints {
    pub fn new(trip_type: TripType, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            trip_type,
            start_date,
            end_date,
            max_price: None,
            min_days: None,
            max_days: None,
            origin_airports: Vec::new(),
            wanted_countries: Vec::new(),
            passengers: PassengerCounts::adults(1),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.trip_type.requires_end_date() && self.end_date.is_none() {
            return Err(CoreError::InvalidConstraints(format!(
                "endDate is required for {:?} trips",
                self.trip_type
            )));
        }

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(CoreError::InvalidConstraints(
                    "endDate must not be before startDate".to_string(),
                ));
            }
        }

        if let Some(max_price) = self.max_price {
            if !max_price.is_finite() || max_price < 0.0 {
                return Err(CoreError::InvalidConstraints(
                    "maxPrice must be a non-negative number".to_string(),
                ));
            }
        }

        self.passengers.validate()
    }

    /// Inclusive range of dates on which the outbound leg may depart.
    pub fn outbound_window(&self) -> (NaiveDate, NaiveDate) {
        (self.start_date, self.end_date.unwrap_or(self.start_date))
    }

    /// Inclusive range of dates on which the inbound leg may depart.
    ///
    /// The end date bounds the outbound departure, so the way home may leave up to
    /// the longest permitted stay after it.
    pub fn inbound_window(&self) -> (NaiveDate, NaiveDate) {
        let (_, last_outbound) = self.outbound_window();
        let slack = match self.trip_type.fixed_window() {
            Some((_, _, span)) => span,
            None => self.max_days.unwrap_or(0),
        };
        let last = last_outbound
            .checked_add_days(Days::new(u64::from(slack)))
            .unwrap_or(last_outbound);
        (self.start_date, last)
    }

    pub fn allows_origin(&self, code: &str) -> bool {
        self.origin_airports.is_empty() || self.origin_airports.iter().any(|o| o == code)
    }

    pub fn allows_country(&self, country: &str) -> bool {
        self.wanted_countries.is_empty()
            || self
                .wanted_countries
                .iter()
                .any(|c| c.trim().eq_ignore_ascii_case(country))
    }
}
