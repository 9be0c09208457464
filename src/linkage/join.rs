use crate::linkage::matcher::MatchMapping;
use crate::models::{GazetteerRecord, JoinedRecord, JoinedTable, MeasurementRecord};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    pub table: JoinedTable,
    pub joined: usize,
    /// Measurement rows whose (city, country) key is absent from the gazetteer.
    pub unmatched_key: usize,
    /// Measurement rows whose key exists but has no complete coordinates.
    pub missing_coordinates: usize,
}

/// Exact (city, country) join of measurements against the gazetteer.
///
/// Both inputs must already carry normalized cities and resolved countries.
/// When a key occurs several times in the gazetteer, the first row in input
/// order with both coordinates is used.
pub struct JoinEngine;

impl JoinEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn join(
        &self,
        measurements: &[MeasurementRecord],
        gazetteer: &[GazetteerRecord],
        mapping: &MatchMapping,
    ) -> JoinOutcome {
        let index = self.index_gazetteer(gazetteer);
        let mut outcome = JoinOutcome::default();
        let mut records = Vec::with_capacity(measurements.len());

        for measurement in measurements {
            let city = mapping.resolve(&measurement.city);

            match index.get(&(city, measurement.country.as_str())) {
                None => outcome.unmatched_key += 1,
                Some(None) => outcome.missing_coordinates += 1,
                Some(Some(position)) => {
                    let place = &gazetteer[*position];
                    match JoinedRecord::from_parts(measurement, place) {
                        Some(mut record) => {
                            record.city = city.to_string();
                            records.push(record);
                        }
                        None => outcome.missing_coordinates += 1,
                    }
                }
            }
        }

        outcome.joined = records.len();
        outcome.table = JoinedTable::new(records);

        debug!(
            joined = outcome.joined,
            unmatched_key = outcome.unmatched_key,
            missing_coordinates = outcome.missing_coordinates,
            "Join finished"
        );

        outcome
    }

    /// Key -> position of the first row with complete coordinates, or `None`
    /// if the key only occurs without them.
    fn index_gazetteer<'a>(
        &self,
        gazetteer: &'a [GazetteerRecord],
    ) -> HashMap<(&'a str, &'a str), Option<usize>> {
        let mut index: HashMap<(&str, &str), Option<usize>> =
            HashMap::with_capacity(gazetteer.len());

        for (position, place) in gazetteer.iter().enumerate() {
            let slot = index
                .entry((place.city.as_str(), place.country.as_str()))
                .or_insert(None);
            if slot.is_none() && place.coordinates().is_some() {
                *slot = Some(position);
            }
        }

        index
    }
}

impl Default for JoinEngine {
    fn default() -> Self {
        Self::new()
    }
}
