/// Default measurement table columns
pub const MEASUREMENT_COUNTRY_COLUMN: &str = "country_name";
pub const MEASUREMENT_CITY_COLUMN: &str = "city_name";
pub const MEASUREMENT_AQI_COLUMN: &str = "aqi_value";
pub const MEASUREMENT_PM25_COLUMN: &str = "pm2.5_aqi_value";
pub const MEASUREMENT_NO2_COLUMN: &str = "no2_aqi_value";
pub const MEASUREMENT_OZONE_COLUMN: &str = "ozone_aqi_value";

/// Default gazetteer table columns
pub const GAZETTEER_CITY_COLUMN: &str = "name";
pub const GAZETTEER_COUNTRY_COLUMN: &str = "country_code";
pub const GAZETTEER_LATITUDE_COLUMN: &str = "latitude";
pub const GAZETTEER_LONGITUDE_COLUMN: &str = "longitude";

/// Table names used in error messages
pub const MEASUREMENT_TABLE: &str = "measurement";
pub const GAZETTEER_TABLE: &str = "gazetteer";

/// Matching defaults
pub const DEFAULT_MATCH_THRESHOLD: f64 = 85.0;

/// Configuration
pub const CONFIG_ENV_PREFIX: &str = "AQ_LINKER";
pub const CONFIG_ENV_SEPARATOR: &str = "__";

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
