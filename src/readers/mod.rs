pub mod concurrent_reader;
pub mod gazetteer_reader;
pub mod measurement_reader;
pub mod source;

pub use concurrent_reader::{ConcurrentReader, SourcePair};
pub use gazetteer_reader::GazetteerReader;
pub use measurement_reader::MeasurementReader;
pub use source::{decode_text, SourceData, SourceFile, SourceFingerprint};
