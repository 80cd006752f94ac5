use chrono::{Datelike, NaiveDate};
use faresweep_core::{FlightLeg, SearchConstraints, TripType};

/// Which way a leg flies relative to the traveller's home airports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegRole {
    Outbound,
    Inbound,
}

/// Leg and pair acceptance rules derived from one set of constraints.
pub struct TripRules<'a> {
    constraints: &'a SearchConstraints,
    window: (NaiveDate, NaiveDate),
    role: LegRole,
}

impl<'a> TripRules<'a> {
    pub fn new(constraints: &'a SearchConstraints, role: LegRole) -> Self {
        let window = match role {
            LegRole::Outbound => constraints.outbound_window(),
            LegRole::Inbound => constraints.inbound_window(),
        };
        Self { constraints, window, role }
    }

    /// Home airport and away country are checked on opposite ends depending on role.
    pub fn accepts(&self, leg: &FlightLeg) -> bool {
        let (home, away_country) = match self.role {
            LegRole::Outbound => (&leg.origin, leg.destination_country()),
            LegRole::Inbound => (&leg.destination, leg.origin_country()),
        };

        let date = leg.departure_date();
        leg.origin != leg.destination
            && self.constraints.allows_origin(home)
            && self.constraints.allows_country(away_country)
            && date >= self.window.0
            && date <= self.window.1
    }
}

/// Whole calendar days between the two departures.
pub fn trip_days(outbound: &FlightLeg, inbound: &FlightLeg) -> i64 {
    (inbound.departure_date() - outbound.departure_date()).num_days()
}

pub fn accepts_pair(constraints: &SearchConstraints, outbound: &FlightLeg, inbound: &FlightLeg) -> bool {
    if inbound.departure_time <= outbound.departure_time {
        return false;
    }
    if inbound.origin != outbound.destination || inbound.destination != outbound.origin {
        return false;
    }

    let days = trip_days(outbound, inbound);
    if let Some(min) = constraints.min_days {
        if days < i64::from(min) {
            return false;
        }
    }
    if let Some(max) = constraints.max_days {
        if days > i64::from(max) {
            return false;
        }
    }

    match constraints.trip_type.fixed_window() {
        Some((depart_on, return_on, span)) => {
            outbound.departure_time.weekday() == depart_on
                && inbound.departure_time.weekday() == return_on
                && days == i64::from(span)
        }
        None => constraints.trip_type == TripType::Return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn leg(origin: &str, destination: &str, y: i32, m: u32, d: u32, h: u32) -> FlightLeg {
        FlightLeg::new(
            origin,
            format!("{}, Ireland", origin),
            destination,
            format!("{}, Spain", destination),
            NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap(),
            10.0,
        )
    }

    fn home(origin: &str, destination: &str, y: i32, m: u32, d: u32, h: u32) -> FlightLeg {
        FlightLeg::new(
            origin,
            format!("{}, Spain", origin),
            destination,
            format!("{}, Ireland", destination),
            NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap(),
            10.0,
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_role_aware_filters() {
        let mut constraints =
            SearchConstraints::new(TripType::Return, date(2024, 3, 1), Some(date(2024, 3, 10)));
        constraints.origin_airports = vec!["DUB".to_string()];
        constraints.wanted_countries = vec!["Spain".to_string()];
        constraints.max_days = Some(7);

        let outbound_rules = TripRules::new(&constraints, LegRole::Outbound);
        let inbound_rules = TripRules::new(&constraints, LegRole::Inbound);

        assert!(outbound_rules.accepts(&leg("DUB", "BCN", 2024, 3, 5, 8)));
        assert!(!outbound_rules.accepts(&leg("ORK", "BCN", 2024, 3, 5, 8)));
        assert!(!outbound_rules.accepts(&leg("DUB", "BCN", 2024, 3, 11, 8)));

        assert!(inbound_rules.accepts(&home("BCN", "DUB", 2024, 3, 15, 8)));
        assert!(!inbound_rules.accepts(&home("BCN", "DUB", 2024, 3, 18, 8)));
        assert!(!inbound_rules.accepts(&home("BCN", "ORK", 2024, 3, 12, 8)));
    }

    #[test]
    fn test_weekend_weekdays() {
        let constraints =
            SearchConstraints::new(TripType::Weekend, date(2024, 3, 15), Some(date(2024, 3, 17)));
        let friday = leg("DUB", "BCN", 2024, 3, 15, 6);
        let sunday = home("BCN", "DUB", 2024, 3, 17, 10);
        let monday = home("BCN", "DUB", 2024, 3, 18, 10);
        assert_eq!(friday.departure_time.weekday(), Weekday::Fri);

        assert!(accepts_pair(&constraints, &friday, &sunday));
        assert!(!accepts_pair(&constraints, &friday, &monday));

        let saturday = leg("DUB", "BCN", 2024, 3, 16, 6);
        assert!(!accepts_pair(&constraints, &saturday, &sunday));
    }

    #[test]
    fn test_long_weekend_requires_same_weekend() {
        let constraints = SearchConstraints::new(
            TripType::LongWeekend,
            date(2024, 3, 14),
            Some(date(2024, 3, 21)),
        );
        let thursday = leg("DUB", "BCN", 2024, 3, 14, 6);
        let monday = home("BCN", "DUB", 2024, 3, 18, 10);
        let monday_after = home("BCN", "DUB", 2024, 3, 25, 10);

        assert!(accepts_pair(&constraints, &thursday, &monday));
        assert!(!accepts_pair(&constraints, &thursday, &monday_after));
    }

    #[test]
    fn test_same_day_return_needs_zero_min_days() {
        let mut constraints =
            SearchConstraints::new(TripType::Return, date(2024, 3, 1), Some(date(2024, 3, 1)));
        let out = leg("DUB", "BCN", 2024, 3, 1, 6);
        let back = home("BCN", "DUB", 2024, 3, 1, 20);

        constraints.min_days = Some(1);
        assert!(!accepts_pair(&constraints, &out, &back));

        constraints.min_days = Some(0);
        assert!(accepts_pair(&constraints, &out, &back));

        let early = home("BCN", "DUB", 2024, 3, 1, 5);
        assert!(!accepts_pair(&constraints, &out, &early));
    }

    #[test]
    fn test_route_symmetry() {
        let constraints =
            SearchConstraints::new(TripType::Return, date(2024, 3, 1), Some(date(2024, 3, 5)));
        let out = leg("DUB", "BCN", 2024, 3, 1, 6);
        assert!(!accepts_pair(&constraints, &out, &home("MAD", "DUB", 2024, 3, 3, 6)));
        assert!(!accepts_pair(&constraints, &out, &home("BCN", "ORK", 2024, 3, 3, 6)));
        assert!(accepts_pair(&constraints, &out, &home("BCN", "DUB", 2024, 3, 3, 6)));
    }
}
