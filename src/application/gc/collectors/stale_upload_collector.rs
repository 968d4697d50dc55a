use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{
    collector::Collector,
    errors::{CollectorResult, GcError},
};
use crate::application::ports::UploadAssembler;

/// Collector for abandoned upload sessions and completed uploads nobody composed
pub struct StaleUploadCollector {
    uploads: Arc<dyn UploadAssembler>,
    max_idle: Duration,
}

#[async_trait]
impl Collector for StaleUploadCollector {
    fn name(&self) -> &'static str {
        "stale_upload_collector"
    }

    async fn collect(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        self.collect_internal()
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

impl StaleUploadCollector {
    pub fn new(uploads: Arc<dyn UploadAssembler>, max_idle: Duration) -> Self {
        Self { uploads, max_idle }
    }

    async fn collect_internal(&self) -> CollectorResult<usize> {
        let count = self
            .uploads
            .reclaim_stale(self.max_idle)
            .await
            .map_err(GcError::deletion_error)?;

        if count > 0 {
            info!("Reclaimed {} stale uploads", count);
        }

        Ok(count)
    }
}
