use crate::error::{ProcessingError, Result};
use crate::models::{JoinedRecord, JoinedTable};
use crate::writers::ParquetWriter;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// US EPA AQI bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    pub fn from_aqi(aqi: f64) -> Self {
        match aqi {
            a if a <= 50.0 => AqiCategory::Good,
            a if a <= 100.0 => AqiCategory::Moderate,
            a if a <= 150.0 => AqiCategory::UnhealthyForSensitiveGroups,
            a if a <= 200.0 => AqiCategory::Unhealthy,
            a if a <= 300.0 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        };
        f.write_str(name)
    }
}

/// Extremes and mean over the rows that carry a reading; `count` is zero
/// and the values are NaN when no row does.
#[derive(Debug, Clone, Serialize)]
pub struct PollutantStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub min_location: String,
    pub max_location: String,
}

impl PollutantStats {
    fn collect(records: &[JoinedRecord], value: fn(&JoinedRecord) -> Option<f64>) -> Self {
        let mut stats = PollutantStats {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            min_location: String::new(),
            max_location: String::new(),
        };
        let mut sum = 0.0;

        for record in records {
            let Some(v) = value(record) else {
                continue;
            };
            stats.count += 1;
            sum += v;
            if v < stats.min {
                stats.min = v;
                stats.min_location = location(record);
            }
            if v > stats.max {
                stats.max = v;
                stats.max_location = location(record);
            }
        }

        if stats.count == 0 {
            stats.min = f64::NAN;
            stats.max = f64::NAN;
            stats.mean = f64::NAN;
            stats.min_location = "No valid measurements".to_string();
            stats.max_location = "No valid measurements".to_string();
        } else {
            stats.mean = sum / stats.count as f64;
        }
        stats
    }

    fn describe(&self) -> String {
        if self.count == 0 {
            return "no readings".to_string();
        }
        format!(
            "{:.1} / {:.1} / {:.1} (cleanest: {}, worst: {})",
            self.min, self.mean, self.max, self.min_location, self.max_location
        )
    }
}

fn location(record: &JoinedRecord) -> String {
    format!("{}, {}", record.city, record.country)
}

#[derive(Debug, Clone, Serialize)]
pub struct GeographicBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AirQualityStatistics {
    pub total_records: usize,
    pub unique_countries: usize,
    pub unique_cities: usize,
    pub aqi: PollutantStats,
    pub pm25: PollutantStats,
    pub no2: PollutantStats,
    pub ozone: PollutantStats,
    /// Row counts per AQI band, in `AqiCategory::ALL` order. Rows without
    /// an AQI reading are not counted.
    pub categories: Vec<(AqiCategory, usize)>,
    pub geographic_bounds: GeographicBounds,
}

pub struct AirQualityAnalyzer;

impl AirQualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze the first `limit` rows of an exported file; 0 reads all rows.
    pub fn analyze_parquet_with_limit(
        &self,
        path: &Path,
        limit: usize,
    ) -> Result<AirQualityStatistics> {
        let writer = ParquetWriter::new();
        let total_rows = writer.get_file_info(path)?.total_rows as usize;

        let records_to_read = if limit == 0 {
            total_rows
        } else {
            limit.min(total_rows)
        };

        let records = writer.read_sample_records(path, records_to_read)?;
        self.analyze_records(&records)
    }

    pub fn analyze_table(&self, table: &JoinedTable) -> Result<AirQualityStatistics> {
        self.analyze_records(table.records())
    }

    pub fn analyze_records(&self, records: &[JoinedRecord]) -> Result<AirQualityStatistics> {
        if records.is_empty() {
            return Err(ProcessingError::InvalidFormat(
                "No records to analyze".to_string(),
            ));
        }

        let mut countries = HashSet::new();
        let mut cities = HashSet::new();
        let mut bounds = GeographicBounds {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        let mut category_counts = [0usize; 6];

        for record in records {
            countries.insert(record.country.as_str());
            cities.insert((record.country.as_str(), record.city.as_str()));

            bounds.min_lat = bounds.min_lat.min(record.latitude);
            bounds.max_lat = bounds.max_lat.max(record.latitude);
            bounds.min_lon = bounds.min_lon.min(record.longitude);
            bounds.max_lon = bounds.max_lon.max(record.longitude);

            if let Some(aqi) = record.aqi {
                let category = AqiCategory::from_aqi(aqi);
                if let Some(slot) = AqiCategory::ALL.iter().position(|c| *c == category) {
                    category_counts[slot] += 1;
                }
            }
        }

        Ok(AirQualityStatistics {
            total_records: records.len(),
            unique_countries: countries.len(),
            unique_cities: cities.len(),
            aqi: PollutantStats::collect(records, |r| r.aqi),
            pm25: PollutantStats::collect(records, |r| r.pm25),
            no2: PollutantStats::collect(records, |r| r.no2),
            ozone: PollutantStats::collect(records, |r| r.ozone),
            categories: AqiCategory::ALL
                .iter()
                .copied()
                .zip(category_counts)
                .collect(),
            geographic_bounds: bounds,
        })
    }
}

impl AirQualityStatistics {
    pub fn summary(&self) -> String {
        let aqi_range = if self.aqi.count == 0 {
            "n/a".to_string()
        } else {
            format!(
                "{:.0} to {:.0} (mean {:.1})",
                self.aqi.min, self.aqi.max, self.aqi.mean
            )
        };

        format!(
            "Parameters: AQI, PM2.5, NO2, Ozone\n\
            Coverage: {} cities in {} countries\n\
            Records: {} total\n\
            AQI Range: {}\n\
            Bounds: {:.2} to {:.2} lat, {:.2} to {:.2} lon",
            self.unique_cities,
            self.unique_countries,
            self.total_records,
            aqi_range,
            self.geographic_bounds.min_lat,
            self.geographic_bounds.max_lat,
            self.geographic_bounds.min_lon,
            self.geographic_bounds.max_lon
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut summary = self.summary();

        summary.push_str("\n\nPollutants (min / mean / max):\n");
        for (name, stats) in [
            ("AQI", &self.aqi),
            ("PM2.5", &self.pm25),
            ("NO2", &self.no2),
            ("Ozone", &self.ozone),
        ] {
            summary.push_str(&format!("- {}: {}\n", name, stats.describe()));
        }

        summary.push_str("\nAQI Categories:\n");
        for (category, count) in &self.categories {
            summary.push_str(&format!(
                "- {}: {} ({:.1}%)\n",
                category,
                count,
                100.0 * *count as f64 / self.total_records as f64
            ));
        }

        summary
    }
}

impl Default for AirQualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
