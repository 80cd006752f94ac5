use chrono::NaiveDateTime;
use faresweep_core::FlightLeg;
use serde::Serialize;

/// A matched outbound leg with an optional way home.
#[derive(Debug, Clone, PartialEq)]
pub struct TripCombination {
    pub outbound: FlightLeg,
    pub inbound: Option<FlightLeg>,
    pub total_price: f64,
}

/// Fields that decide whether two combinations are the same trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinationKey {
    outbound: (String, String, NaiveDateTime),
    inbound: Option<(String, String, NaiveDateTime)>,
}

impl TripCombination {
    pub fn new(outbound: FlightLeg, inbound: Option<FlightLeg>, passengers: u32) -> Self {
        let total_price = total_price(&outbound, inbound.as_ref(), passengers);
        Self { outbound, inbound, total_price }
    }

    pub fn key(&self) -> CombinationKey {
        let identity = |leg: &FlightLeg| {
            (leg.origin.clone(), leg.destination.clone(), leg.departure_time)
        };
        CombinationKey {
            outbound: identity(&self.outbound),
            inbound: self.inbound.as_ref().map(identity),
        }
    }

    pub fn payload(&self) -> CombinationPayload<'_> {
        CombinationPayload {
            outbound: LegPayload::from(&self.outbound),
            inbound: self.inbound.as_ref().map(LegPayload::from),
            total_price: self.total_price,
        }
    }
}

/// Every passenger category pays the full per-leg fare.
pub fn total_price(outbound: &FlightLeg, inbound: Option<&FlightLeg>, passengers: u32) -> f64 {
    let n = f64::from(passengers);
    let inbound_price = inbound.map(|leg| leg.price * n).unwrap_or(0.0);
    round_currency(outbound.price * n + inbound_price)
}

pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Wire shape of one leg inside a combination event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegPayload<'a> {
    pub origin: &'a str,
    pub origin_full: &'a str,
    pub destination: &'a str,
    pub destination_full: &'a str,
    pub departure_time: NaiveDateTime,
}

impl<'a> From<&'a FlightLeg> for LegPayload<'a> {
    fn from(leg: &'a FlightLeg) -> Self {
        Self {
            origin: &leg.origin,
            origin_full: &leg.origin_full,
            destination: &leg.destination,
            destination_full: &leg.destination_full,
            departure_time: leg.departure_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationPayload<'a> {
    pub outbound: LegPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound: Option<LegPayload<'a>>,
    pub total_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn leg(origin: &str, destination: &str, day: u32, hour: u32, minute: u32, price: f64) -> FlightLeg {
        FlightLeg::new(
            origin,
            format!("{} Airport", origin),
            destination,
            format!("{} Airport", destination),
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(hour, minute, 0).unwrap(),
            price,
        )
    }

    #[test]
    fn test_total_price_rounds_to_cents() {
        let combo = TripCombination::new(
            leg("DUB", "BCN", 15, 6, 30, 40.0),
            Some(leg("BCN", "DUB", 17, 10, 15, 29.42)),
            1,
        );
        assert_eq!(combo.total_price, 69.42);

        let family = TripCombination::new(leg("DUB", "BCN", 15, 6, 30, 19.99), None, 3);
        assert_eq!(family.total_price, 59.97);
    }

    #[test]
    fn test_key_ignores_price() {
        let a = TripCombination::new(leg("DUB", "BCN", 15, 6, 30, 40.0), None, 1);
        let b = TripCombination::new(leg("DUB", "BCN", 15, 6, 30, 55.0), None, 1);
        let c = TripCombination::new(leg("DUB", "BCN", 15, 7, 30, 40.0), None, 1);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_payload_wire_format() {
        let outbound = FlightLeg::new(
            "DUB",
            "Dublin",
            "BCN",
            "Barcelona",
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(6, 30, 0).unwrap(),
            40.0,
        );
        let one_way = TripCombination::new(outbound, None, 1);
        let json = serde_json::to_string(&one_way.payload()).unwrap();
        assert_eq!(
            json,
            r#"{"outbound":{"origin":"DUB","originFull":"Dublin","destination":"BCN","destinationFull":"Barcelona","departureTime":"2024-03-15T06:30:00"},"totalPrice":40.0}"#
        );
    }
}
