pub mod gazetteer;
pub mod joined;
pub mod measurement;

pub use gazetteer::GazetteerRecord;
pub use joined::{CountryOverview, JoinedRecord, JoinedTable};
pub use measurement::MeasurementRecord;
