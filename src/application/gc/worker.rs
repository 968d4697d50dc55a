use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time;
use tracing::{error, info};

use crate::application::gc::collectors::{
    Collector, CollectorResult, OrphanedRecordCollector, StaleUploadCollector,
};
use crate::application::gc::config::GcConfig;
use crate::application::gc::results::{GcResult, GcStatistics};
use crate::application::gc::scheduler::TaskScheduler;
use crate::application::ports::{ImageRepository, ImageStore, UploadAssembler};

const ORPHANED_RECORDS: &str = "orphaned_record_collector";
const STALE_UPLOADS: &str = "stale_upload_collector";

/// Maintenance sweep over records, files and upload sessions.
///
/// Two collectors are registered:
/// - **Orphaned records**: drops raw and final records whose file is gone
/// - **Stale uploads**: reclaims abandoned chunk sessions, on a slower schedule
///
/// `run` loops forever on the configured interval; `collect_once` runs a
/// single scheduled cycle and `sweep` runs every collector unconditionally,
/// which is what the `sweep` subcommand uses.
pub struct GarbageCollector {
    collectors: Vec<Box<dyn Collector + Send + Sync>>,
    config: GcConfig,
    stale_upload_scheduler: TaskScheduler,
    statistics: Mutex<GcStatistics>,
}

impl GarbageCollector {
    pub fn new(
        repository: Arc<dyn ImageRepository>,
        store: Arc<dyn ImageStore>,
        uploads: Arc<dyn UploadAssembler>,
        config: GcConfig,
    ) -> Self {
        let collectors: Vec<Box<dyn Collector + Send + Sync>> = vec![
            Box::new(OrphanedRecordCollector::new(
                repository,
                store,
                config.batch_size,
            )),
            Box::new(StaleUploadCollector::new(uploads, config.upload_session_ttl)),
        ];

        Self {
            collectors,
            stale_upload_scheduler: TaskScheduler::new(config.stale_upload_cleanup_interval()),
            config,
            statistics: Mutex::new(GcStatistics::default()),
        }
    }

    /// Run garbage collection loop
    pub async fn run(self: Arc<Self>) {
        info!(
            "Starting garbage collector with interval: {:?}",
            self.config.interval
        );

        let mut interval = time::interval(self.config.interval);

        loop {
            interval.tick().await;

            match self.collect_once().await {
                Ok(result) => {
                    if result.has_deletions() {
                        info!("{}", result.summary());
                    }
                    for error in &result.errors {
                        error!("GC error: {}", error);
                    }
                }
                Err(e) => {
                    error!("Garbage collection cycle failed: {}", e);
                }
            }
        }
    }

    /// One scheduled cycle; stale uploads are only reclaimed when due
    pub async fn collect_once(&self) -> CollectorResult<GcResult> {
        self.collect(false).await
    }

    /// Every collector, regardless of schedule
    pub async fn sweep(&self) -> CollectorResult<GcResult> {
        self.collect(true).await
    }

    pub fn statistics(&self) -> GcStatistics {
        self.statistics.lock().clone()
    }

    async fn collect(&self, force: bool) -> CollectorResult<GcResult> {
        let mut result = GcResult::default();

        for collector in &self.collectors {
            let name = collector.name();
            let should_run = match name {
                STALE_UPLOADS => force || self.stale_upload_scheduler.should_run(),
                _ => true,
            };
            if !should_run {
                continue;
            }

            match collector.collect().await {
                Ok(count) => match name {
                    ORPHANED_RECORDS => result.orphaned_records_deleted += count,
                    STALE_UPLOADS => result.stale_uploads_reclaimed += count,
                    _ => {}
                },
                Err(e) => result.add_error(format!("{} collection failed: {}", name, e)),
            }
        }

        result.total_deleted = result.orphaned_records_deleted + result.stale_uploads_reclaimed;
        self.statistics.lock().update(&result);
        Ok(result)
    }
}
