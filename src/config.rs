//! Layered configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an optional
//! TOML/JSON/YAML file, and `AQ_LINKER_*` environment variables (nested keys
//! separated by `__`, e.g. `AQ_LINKER_MATCHING__THRESHOLD=90`). The CLI
//! applies its own flags on top of the loaded value.

use crate::error::Result;
use crate::linkage::{CountryResolution, Scorer};
use crate::utils::constants::*;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MeasurementColumns {
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub aqi: String,
    #[validate(length(min = 1))]
    pub pm25: String,
    #[validate(length(min = 1))]
    pub no2: String,
    #[validate(length(min = 1))]
    pub ozone: String,
}

impl Default for MeasurementColumns {
    fn default() -> Self {
        Self {
            country: MEASUREMENT_COUNTRY_COLUMN.to_string(),
            city: MEASUREMENT_CITY_COLUMN.to_string(),
            aqi: MEASUREMENT_AQI_COLUMN.to_string(),
            pm25: MEASUREMENT_PM25_COLUMN.to_string(),
            no2: MEASUREMENT_NO2_COLUMN.to_string(),
            ozone: MEASUREMENT_OZONE_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GazetteerColumns {
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub latitude: String,
    #[validate(length(min = 1))]
    pub longitude: String,
}

impl Default for GazetteerColumns {
    fn default() -> Self {
        Self {
            city: GAZETTEER_CITY_COLUMN.to_string(),
            country: GAZETTEER_COUNTRY_COLUMN.to_string(),
            latitude: GAZETTEER_LATITUDE_COLUMN.to_string(),
            longitude: GAZETTEER_LONGITUDE_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MatchSettings {
    pub scorer: Scorer,

    /// A match is accepted when its score is strictly greater than this.
    #[validate(range(min = 0.0, max = 100.0))]
    pub threshold: f64,

    /// Upper bound on source x candidate comparisons; 0 disables the guard.
    pub max_pairs: u64,

    /// Worker threads for the scoring pass; 0 uses every core.
    pub max_workers: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            scorer: Scorer::Ratio,
            threshold: DEFAULT_MATCH_THRESHOLD,
            max_pairs: 0,
            max_workers: 0,
        }
    }
}

impl MatchSettings {
    pub fn workers(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get()
        } else {
            self.max_workers
        }
    }

    pub fn pair_limit(&self) -> Option<u64> {
        (self.max_pairs > 0).then_some(self.max_pairs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LinkerConfig {
    #[validate(nested)]
    pub measurement_columns: MeasurementColumns,

    #[validate(nested)]
    pub gazetteer_columns: GazetteerColumns,

    #[validate(nested)]
    pub matching: MatchSettings,

    pub country_resolution: CountryResolution,

    /// Read source files through a memory map instead of buffered reads.
    pub use_mmap: bool,
}

impl LinkerConfig {
    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env_prefix(path, CONFIG_ENV_PREFIX)
    }

    pub fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&LinkerConfig::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator(CONFIG_ENV_SEPARATOR),
        );

        let config: LinkerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}
