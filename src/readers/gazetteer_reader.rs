use crate::config::GazetteerColumns;
use crate::error::Result;
use crate::models::GazetteerRecord;
use crate::readers::source::{column_index, parse_optional_number, SourceFile};
use crate::utils::constants::GAZETTEER_TABLE;
use std::path::Path;
use tracing::debug;
use validator::Validate;

/// Reads the city-coordinate gazetteer (GeoNames-style CSV export).
pub struct GazetteerReader {
    columns: GazetteerColumns,
}

impl GazetteerReader {
    pub fn new() -> Self {
        Self {
            columns: GazetteerColumns::default(),
        }
    }

    pub fn with_columns(mut self, columns: GazetteerColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Read gazetteer records from a CSV file
    pub fn read_gazetteer(&self, path: &Path) -> Result<Vec<GazetteerRecord>> {
        let source = SourceFile::open(path, false)?;
        self.read_from_source(&source)
    }

    pub fn read_from_source(&self, source: &SourceFile) -> Result<Vec<GazetteerRecord>> {
        let records = self.read_from_str(&source.text())?;
        debug!(path = %source.path.display(), rows = records.len(), "Read gazetteer");
        Ok(records)
    }

    /// Parse CSV text; coordinates may be empty, everything else is required.
    pub fn read_from_str(&self, text: &str) -> Result<Vec<GazetteerRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let city_idx = column_index(&headers, GAZETTEER_TABLE, &self.columns.city)?;
        let country_idx = column_index(&headers, GAZETTEER_TABLE, &self.columns.country)?;
        let lat_idx = column_index(&headers, GAZETTEER_TABLE, &self.columns.latitude)?;
        let lon_idx = column_index(&headers, GAZETTEER_TABLE, &self.columns.longitude)?;

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let line = row.position().map_or(index + 2, |p| p.line() as usize);
            let field = |idx: usize| row.get(idx).unwrap_or("");

            let record = GazetteerRecord::new(
                field(city_idx).trim(),
                field(country_idx).trim(),
                parse_optional_number(
                    field(lat_idx),
                    GAZETTEER_TABLE,
                    line,
                    &self.columns.latitude,
                )?,
                parse_optional_number(
                    field(lon_idx),
                    GAZETTEER_TABLE,
                    line,
                    &self.columns.longitude,
                )?,
            );
            record.validate()?;
            records.push(record);
        }

        Ok(records)
    }
}

impl Default for GazetteerReader {
    fn default() -> Self {
        Self::new()
    }
}
