pub mod batch_processor;
pub mod collector;
pub mod errors;
pub mod orphaned_record_collector;
pub mod stale_upload_collector;
#[cfg(test)]
pub mod test_utils;

pub use batch_processor::{BatchConfig, BatchItemResult, BatchProcessor};
pub use collector::Collector;
pub use errors::{CollectorResult, GcError};
pub use orphaned_record_collector::OrphanedRecordCollector;
pub use stale_upload_collector::StaleUploadCollector;
