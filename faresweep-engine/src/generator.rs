use std::cmp::Ordering;
use std::collections::HashSet;

use faresweep_core::{CoreError, CoreResult, FlightLeg, SearchConstraints};
use tracing::debug;

use crate::models::TripCombination;
use crate::rules::{accepts_pair, LegRole, TripRules};

/// Finite, price-ordered sequence of combinations for one request.
#[derive(Debug)]
pub struct Combinations {
    inner: std::vec::IntoIter<TripCombination>,
}

impl Combinations {
    pub fn empty() -> Self {
        Self { inner: Vec::new().into_iter() }
    }
}

impl Iterator for Combinations {
    type Item = TripCombination;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Combinations {}

/// Pairs outbound and inbound legs into priced trip combinations
pub struct CombinationEngine<'a> {
    constraints: &'a SearchConstraints,
}

impl<'a> CombinationEngine<'a> {
    pub fn new(constraints: &'a SearchConstraints) -> Self {
        Self { constraints }
    }

    /// Filter, pair, price, deduplicate and sort.
    ///
    /// `inbound` is ignored for one-way searches. Computation is eager; the
    /// returned iterator only hands out the finished list.
    pub fn generate(
        &self,
        outbound: &[FlightLeg],
        inbound: Option<&[FlightLeg]>,
    ) -> CoreResult<Combinations> {
        let constraints = self.constraints;
        if constraints.trip_type.requires_end_date() && constraints.end_date.is_none() {
            return Err(CoreError::InvalidConstraints(format!(
                "endDate is required for {:?} trips",
                constraints.trip_type
            )));
        }

        if let (Some(min), Some(max)) = (constraints.min_days, constraints.max_days) {
            if min > max {
                debug!("minDays {} exceeds maxDays {}, nothing can match", min, max);
                return Ok(Combinations::empty());
            }
        }

        // 1. Filtering
        let outbound_rules = TripRules::new(constraints, LegRole::Outbound);
        let outbound: Vec<&FlightLeg> = outbound.iter().filter(|l| outbound_rules.accepts(l)).collect();

        let passengers = constraints.passengers.total();

        // 2. Pairing and 3. pricing
        let priced: Vec<TripCombination> = if constraints.trip_type.has_inbound() {
            let inbound_rules = TripRules::new(constraints, LegRole::Inbound);
            let inbound: Vec<&FlightLeg> = inbound
                .unwrap_or_default()
                .iter()
                .filter(|l| inbound_rules.accepts(l))
                .collect();

            debug!(
                "Pairing {} outbound with {} inbound legs",
                outbound.len(),
                inbound.len()
            );

            outbound
                .iter()
                .flat_map(|out| {
                    inbound
                        .iter()
                        .filter(move |back| accepts_pair(constraints, out, back))
                        .map(move |back| {
                            TripCombination::new((*out).clone(), Some((*back).clone()), passengers)
                        })
                })
                .collect()
        } else {
            outbound
                .iter()
                .map(|out| TripCombination::new((*out).clone(), None, passengers))
                .collect()
        };

        // 4. Budget
        let affordable = priced.into_iter().filter(|c| match constraints.max_price {
            Some(max) => c.total_price <= max,
            None => true,
        });

        // 5. Deduplication, first seen wins
        let mut seen = HashSet::new();
        let mut combinations: Vec<TripCombination> =
            affordable.filter(|c| seen.insert(c.key())).collect();

        // 6. Sort
        combinations.sort_by(compare);

        debug!("Generated {} combinations", combinations.len());
        Ok(Combinations { inner: combinations.into_iter() })
    }
}

fn compare(a: &TripCombination, b: &TripCombination) -> Ordering {
    a.total_price
        .total_cmp(&b.total_price)
        .then_with(|| a.outbound.departure_time.cmp(&b.outbound.departure_time))
        .then_with(|| {
            let a_in = a.inbound.as_ref().map(|l| l.departure_time);
            let b_in = b.inbound.as_ref().map(|l| l.departure_time);
            a_in.cmp(&b_in)
        })
        .then_with(|| a.outbound.origin.cmp(&b.outbound.origin))
        .then_with(|| a.outbound.destination.cmp(&b.outbound.destination))
}
