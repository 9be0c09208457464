use crate::error::{ProcessingError, Result};
use crate::models::{JoinedRecord, JoinedTable};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const COUNTRY: &str = "Country";
const CITY: &str = "City";
const AQI: &str = "AQI";
const PM25: &str = "PM2.5";
const NO2: &str = "NO2";
const OZONE: &str = "Ozone";
const LAT: &str = "lat";
const LON: &str = "lon";

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write joined records to a Parquet file. An empty slice still produces
    /// a valid file with the schema and no rows.
    pub fn write_records(&self, records: &[JoinedRecord], path: &Path) -> Result<()> {
        self.write_records_batched(records, path, records.len().max(1))
    }

    /// Write records in batches for memory efficiency
    pub fn write_records_batched(
        &self,
        records: &[JoinedRecord],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        let schema = Self::create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in records.chunks(batch_size.max(1)) {
            let batch = Self::records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        debug!(path = %path.display(), rows = records.len(), "Wrote Parquet file");
        Ok(())
    }

    pub fn write_table(&self, table: &JoinedTable, path: &Path) -> Result<()> {
        self.write_records(table.records(), path)
    }

    /// Column layout expected by the dashboard.
    fn create_schema() -> Arc<Schema> {
        let fields = vec![
            Field::new(COUNTRY, DataType::Utf8, false),
            Field::new(CITY, DataType::Utf8, false),
            Field::new(AQI, DataType::Float64, true),
            Field::new(PM25, DataType::Float64, true),
            Field::new(NO2, DataType::Float64, true),
            Field::new(OZONE, DataType::Float64, true),
            Field::new(LAT, DataType::Float64, false),
            Field::new(LON, DataType::Float64, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(records: &[JoinedRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
        let strings = |f: fn(&JoinedRecord) -> &str| -> Arc<dyn Array> {
            Arc::new(StringArray::from_iter_values(records.iter().map(f)))
        };
        let floats = |f: fn(&JoinedRecord) -> f64| -> Arc<dyn Array> {
            Arc::new(Float64Array::from_iter_values(records.iter().map(f)))
        };
        let readings = |f: fn(&JoinedRecord) -> Option<f64>| -> Arc<dyn Array> {
            Arc::new(records.iter().map(f).collect::<Float64Array>())
        };

        let batch = RecordBatch::try_new(
            schema,
            vec![
                strings(|r| r.country.as_str()),
                strings(|r| r.city.as_str()),
                readings(|r| r.aqi),
                readings(|r| r.pm25),
                readings(|r| r.no2),
                readings(|r| r.ozone),
                floats(|r| r.latitude),
                floats(|r| r.longitude),
            ],
        )?;

        Ok(batch)
    }

    /// Read up to `limit` records from a Parquet file
    pub fn read_sample_records(&self, path: &Path, limit: usize) -> Result<Vec<JoinedRecord>> {
        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut records = Vec::new();

        for batch_result in parquet_reader {
            if records.len() >= limit {
                break;
            }
            let batch = batch_result?;

            let countries = string_column(&batch, COUNTRY)?;
            let cities = string_column(&batch, CITY)?;
            let aqi = float_column(&batch, AQI)?;
            let pm25 = float_column(&batch, PM25)?;
            let no2 = float_column(&batch, NO2)?;
            let ozone = float_column(&batch, OZONE)?;
            let lat = float_column(&batch, LAT)?;
            let lon = float_column(&batch, LON)?;

            let reading = |column: &Float64Array, i: usize| {
                (!column.is_null(i)).then(|| column.value(i))
            };

            let take = batch.num_rows().min(limit - records.len());
            for i in 0..take {
                records.push(JoinedRecord::new(
                    countries.value(i),
                    cities.value(i),
                    reading(aqi, i),
                    reading(pm25, i),
                    reading(no2, i),
                    reading(ozone, i),
                    lat.value(i),
                    lon.value(i),
                ));
            }
        }

        Ok(records)
    }

    /// Read a whole exported file back into a table.
    pub fn read_table(&self, path: &Path) -> Result<JoinedTable> {
        Ok(JoinedTable::new(self.read_sample_records(path, usize::MAX)?))
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        // Report what the file was written with, not this writer's setting
        let compression = (row_groups > 0)
            .then(|| metadata.row_group(0))
            .filter(|rg| rg.num_columns() > 0)
            .map(|rg| rg.column(0).compression())
            .unwrap_or(self.compression);

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Missing or invalid {} column", name)))
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Missing or invalid {} column", name)))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}
