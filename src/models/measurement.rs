use serde::{Deserialize, Serialize};
use validator::Validate;

/// One row of the air-quality measurement table.
///
/// `country` and `city` hold the raw source text until the pipeline
/// overwrites them with their resolved and normalized forms. A pollutant
/// reading is `None` when its source cell was blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MeasurementRecord {
    pub country: String,

    pub city: String,

    #[validate(range(min = 0.0))]
    pub aqi: Option<f64>,

    #[validate(range(min = 0.0))]
    pub pm25: Option<f64>,

    #[validate(range(min = 0.0))]
    pub no2: Option<f64>,

    #[validate(range(min = 0.0))]
    pub ozone: Option<f64>,
}

impl MeasurementRecord {
    pub fn new(
        country: impl Into<String>,
        city: impl Into<String>,
        aqi: impl Into<Option<f64>>,
        pm25: impl Into<Option<f64>>,
        no2: impl Into<Option<f64>>,
        ozone: impl Into<Option<f64>>,
    ) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            aqi: aqi.into(),
            pm25: pm25.into(),
            no2: no2.into(),
            ozone: ozone.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_validation() {
        let record = MeasurementRecord::new("France", "Paris", 50.0, 20.0, 10.0, 5.0);
        assert!(record.validate().is_ok());

        let negative = MeasurementRecord::new("France", "Paris", -1.0, 20.0, 10.0, 5.0);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_missing_reading_is_valid() {
        let record = MeasurementRecord::new("France", "Lyon", 40.0, 15.0, 3.0, None);
        assert!(record.validate().is_ok());
        assert_eq!(record.ozone, None);
    }
}
