use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use crate::models::{GazetteerRecord, MeasurementRecord};

/// A measurement row with the coordinates of its gazetteer city.
///
/// Serialized column names are the ones the dashboard reads. Missing
/// pollutant readings serialize as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct JoinedRecord {
    #[serde(rename = "Country")]
    pub country: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "AQI")]
    pub aqi: Option<f64>,

    #[serde(rename = "PM2.5")]
    pub pm25: Option<f64>,

    #[serde(rename = "NO2")]
    pub no2: Option<f64>,

    #[serde(rename = "Ozone")]
    pub ozone: Option<f64>,

    #[serde(rename = "lat")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[serde(rename = "lon")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl JoinedRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        country: impl Into<String>,
        city: impl Into<String>,
        aqi: impl Into<Option<f64>>,
        pm25: impl Into<Option<f64>>,
        no2: impl Into<Option<f64>>,
        ozone: impl Into<Option<f64>>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            aqi: aqi.into(),
            pm25: pm25.into(),
            no2: no2.into(),
            ozone: ozone.into(),
            latitude,
            longitude,
        }
    }

    /// Combine a measurement with a gazetteer row; `None` unless the
    /// gazetteer row has both coordinates.
    pub fn from_parts(measurement: &MeasurementRecord, place: &GazetteerRecord) -> Option<Self> {
        let (latitude, longitude) = place.coordinates()?;
        Some(Self::new(
            measurement.country.clone(),
            measurement.city.clone(),
            measurement.aqi,
            measurement.pm25,
            measurement.no2,
            measurement.ozone,
            latitude,
            longitude,
        ))
    }
}

/// Averages shown for a country in the dashboard drill-down.
///
/// Each average covers the rows that carry that reading; it is `None`
/// when no row does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryOverview {
    pub country: String,
    pub records: usize,
    pub cities: Vec<String>,
    pub avg_aqi: Option<f64>,
    pub avg_pm25: Option<f64>,
    pub avg_no2: Option<f64>,
    pub avg_ozone: Option<f64>,
}

fn format_average(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

impl CountryOverview {
    pub fn summary(&self) -> String {
        format!(
            "Country Overview: {}\n\
            - Records: {}\n\
            - Cities: {}\n\
            - PM2.5: {} µg/m³\n\
            - NO2: {} ppb\n\
            - Ozone: {}\n\
            - AQI: {}",
            self.country,
            self.records,
            self.cities.len(),
            format_average(self.avg_pm25),
            format_average(self.avg_no2),
            format_average(self.avg_ozone),
            format_average(self.avg_aqi)
        )
    }
}

/// The joined table handed to the presentation layer.
///
/// Rows keep the order of the measurement input. The table is read-only
/// once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinedTable {
    records: Vec<JoinedRecord>,
}

impl JoinedTable {
    pub fn new(records: Vec<JoinedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[JoinedRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JoinedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct countries, sorted.
    pub fn countries(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct cities of a country, sorted.
    pub fn cities_in_country(&self, country: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.country == country)
            .map(|r| r.city.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn country_records(&self, country: &str) -> Vec<&JoinedRecord> {
        self.records.iter().filter(|r| r.country == country).collect()
    }

    /// Rows for a city name across all countries.
    pub fn city_records(&self, city: &str) -> Vec<&JoinedRecord> {
        self.records.iter().filter(|r| r.city == city).collect()
    }

    pub fn country_overview(&self, country: &str) -> Option<CountryOverview> {
        let rows = self.country_records(country);
        if rows.is_empty() {
            return None;
        }

        let mean = |f: fn(&JoinedRecord) -> Option<f64>| {
            let (sum, count) = rows
                .iter()
                .filter_map(|r| f(r))
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            (count > 0).then(|| sum / count as f64)
        };

        Some(CountryOverview {
            country: country.to_string(),
            records: rows.len(),
            cities: self
                .cities_in_country(country)
                .into_iter()
                .map(str::to_string)
                .collect(),
            avg_aqi: mean(|r| r.aqi),
            avg_pm25: mean(|r| r.pm25),
            avg_no2: mean(|r| r.no2),
            avg_ozone: mean(|r| r.ozone),
        })
    }
}

impl From<Vec<JoinedRecord>> for JoinedTable {
    fn from(records: Vec<JoinedRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a JoinedTable {
    type Item = &'a JoinedRecord;
    type IntoIter = std::slice::Iter<'a, JoinedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
