pub mod cache;
pub mod linkage_report;
pub mod pipeline;

pub use cache::{CacheStats, TableCache};
pub use linkage_report::LinkageReport;
pub use pipeline::{LinkageOutcome, LinkagePipeline};
