use crate::config::MeasurementColumns;
use crate::error::Result;
use crate::models::MeasurementRecord;
use crate::readers::source::{column_index, parse_optional_number, SourceFile};
use crate::utils::constants::MEASUREMENT_TABLE;
use std::path::Path;
use tracing::debug;
use validator::Validate;

/// Reads the per-city air-quality measurement table.
pub struct MeasurementReader {
    columns: MeasurementColumns,
}

impl MeasurementReader {
    pub fn new() -> Self {
        Self {
            columns: MeasurementColumns::default(),
        }
    }

    pub fn with_columns(mut self, columns: MeasurementColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn read_measurements(&self, path: &Path) -> Result<Vec<MeasurementRecord>> {
        let source = SourceFile::open(path, false)?;
        self.read_from_source(&source)
    }

    pub fn read_from_source(&self, source: &SourceFile) -> Result<Vec<MeasurementRecord>> {
        let records = self.read_from_str(&source.text())?;
        debug!(path = %source.path.display(), rows = records.len(), "Read measurements");
        Ok(records)
    }

    /// Blank pollutant cells load as missing readings; non-numeric text is an error.
    pub fn read_from_str(&self, text: &str) -> Result<Vec<MeasurementRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let columns = &self.columns;
        let country_idx = column_index(&headers, MEASUREMENT_TABLE, &columns.country)?;
        let city_idx = column_index(&headers, MEASUREMENT_TABLE, &columns.city)?;
        let aqi_idx = column_index(&headers, MEASUREMENT_TABLE, &columns.aqi)?;
        let pm25_idx = column_index(&headers, MEASUREMENT_TABLE, &columns.pm25)?;
        let no2_idx = column_index(&headers, MEASUREMENT_TABLE, &columns.no2)?;
        let ozone_idx = column_index(&headers, MEASUREMENT_TABLE, &columns.ozone)?;

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let line = row.position().map_or(index + 2, |p| p.line() as usize);
            let field = |idx: usize| row.get(idx).unwrap_or("");
            let reading = |idx: usize, column: &str| {
                parse_optional_number(field(idx), MEASUREMENT_TABLE, line, column)
            };

            let record = MeasurementRecord::new(
                field(country_idx).trim(),
                field(city_idx).trim(),
                reading(aqi_idx, columns.aqi.as_str())?,
                reading(pm25_idx, columns.pm25.as_str())?,
                reading(no2_idx, columns.no2.as_str())?,
                reading(ozone_idx, columns.ozone.as_str())?,
            );
            record.validate()?;
            records.push(record);
        }

        Ok(records)
    }
}

impl Default for MeasurementReader {
    fn default() -> Self {
        Self::new()
    }
}
