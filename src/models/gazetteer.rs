use serde::{Deserialize, Serialize};
use validator::Validate;

/// One row of the city-coordinate gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GazetteerRecord {
    pub city: String,

    pub country: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

impl GazetteerRecord {
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            latitude,
            longitude,
        }
    }

    /// Latitude and longitude, if both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gazetteer_validation() {
        let paris = GazetteerRecord::new("Paris", "FR", Some(48.85), Some(2.35));
        assert!(paris.validate().is_ok());
        assert_eq!(paris.coordinates(), Some((48.85, 2.35)));

        let invalid = GazetteerRecord::new("Nowhere", "FR", Some(91.0), Some(2.35));
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_partial_coordinates() {
        let record = GazetteerRecord::new("Paris", "FR", None, Some(2.35));
        assert!(record.validate().is_ok());
        assert_eq!(record.coordinates(), None);
    }
}
