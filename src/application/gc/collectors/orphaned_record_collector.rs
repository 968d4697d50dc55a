use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    batch_processor::{BatchConfig, BatchProcessor},
    collector::Collector,
    errors::{CollectorResult, GcError},
};
use crate::application::ports::{ImageRecord, ImageRepository, ImageStore};
use crate::domain::value_objects::{ImageId, StorageNamespace};

/// What happened to a single record during a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordCheck {
    Present,
    Removed,
    Failed,
}

/// Removes image records whose backing file no longer exists.
///
/// Pages through every raw and final record by id, checks the files of a
/// page concurrently and deletes the records that point at nothing. A
/// record whose file check fails is left alone until the next sweep.
pub struct OrphanedRecordCollector {
    repository: Arc<dyn ImageRepository>,
    store: Arc<dyn ImageStore>,
    page_size: i64,
    batch: BatchConfig,
}

#[async_trait]
impl Collector for OrphanedRecordCollector {
    fn name(&self) -> &'static str {
        "orphaned_record_collector"
    }

    async fn collect(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        self.collect_internal()
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

impl OrphanedRecordCollector {
    pub fn new(
        repository: Arc<dyn ImageRepository>,
        store: Arc<dyn ImageStore>,
        page_size: i64,
    ) -> Self {
        Self {
            repository,
            store,
            page_size: page_size.max(1),
            batch: BatchConfig::default(),
        }
    }

    async fn collect_internal(&self) -> CollectorResult<usize> {
        let mut after: Option<ImageId> = None;
        let mut removed = 0;
        let mut failures = Vec::new();
        let mut checked = 0;

        loop {
            let page = self
                .repository
                .list_page(after, self.page_size)
                .await
                .map_err(|e| GcError::QueryError { source: e.into() })?;

            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id());
            let full_page = page.len() as i64 >= self.page_size;
            checked += page.len();

            let results =
                BatchProcessor::process_concurrent(page, &self.batch, |record| self.check(record))
                    .await;

            for outcome in results {
                match outcome.result {
                    RecordCheck::Removed => removed += 1,
                    RecordCheck::Failed => failures.push(outcome.item.id().to_string()),
                    RecordCheck::Present => {}
                }
            }

            if !full_page {
                break;
            }
        }

        debug!(checked, removed, "orphaned record sweep finished");

        if !failures.is_empty() {
            return Err(GcError::PartialBatchFailure {
                successful: removed,
                total: removed + failures.len(),
                failures,
            });
        }

        if removed > 0 {
            info!("Removed {} records without a backing file", removed);
        }
        Ok(removed)
    }

    async fn check(&self, record: ImageRecord) -> RecordCheck {
        let namespace = match record {
            ImageRecord::Raw(_) => StorageNamespace::Raw,
            ImageRecord::Final(_) => StorageNamespace::Final,
        };
        let id = record.id();
        let file_name = record.file_name();

        match self.store.exists(namespace, file_name).await {
            Ok(true) => return RecordCheck::Present,
            Ok(false) => {}
            Err(e) => {
                warn!(image_id = %id, file = file_name, error = %e, "could not check backing file");
                return RecordCheck::Failed;
            }
        }

        warn!(image_id = %id, file = file_name, "record has no backing file, removing it");
        if let Err(e) = self.repository.delete(&id).await {
            warn!(image_id = %id, error = %e, "failed to remove orphaned record");
            return RecordCheck::Failed;
        }
        // thumbnail may still be around
        if let Err(e) = self.store.delete(namespace, file_name).await {
            debug!(image_id = %id, error = %e, "leftover thumbnail not removed");
        }
        RecordCheck::Removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gc::collectors::test_utils::{sample_final, sample_raw, FakeImageStore};
    use crate::application::ports::{MockImageRepository, RepositoryError};
    use parking_lot::Mutex;

    fn paged_repository(
        records: Vec<ImageRecord>,
    ) -> (MockImageRepository, Arc<Mutex<Vec<ImageId>>>) {
        let deleted = Arc::new(Mutex::new(Vec::new()));
        let mut repo = MockImageRepository::new();
        repo.expect_list_page().returning(move |after, limit| {
            let start = match after {
                Some(id) => records.iter().position(|r| r.id() == id).map_or(0, |i| i + 1),
                None => 0,
            };
            Ok(records.iter().skip(start).take(limit as usize).cloned().collect())
        });
        let sink = Arc::clone(&deleted);
        repo.expect_delete().returning(move |id| {
            sink.lock().push(*id);
            Ok(())
        });
        (repo, deleted)
    }

    #[tokio::test]
    async fn test_collect_no_records() {
        let (repo, deleted) = paged_repository(vec![]);
        let collector =
            OrphanedRecordCollector::new(Arc::new(repo), Arc::new(FakeImageStore::default()), 10);

        assert_eq!(collector.collect().await.unwrap(), 0);
        assert!(deleted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_collect_removes_records_without_files_across_pages() {
        let kept_raw = sample_raw("kept.jpg");
        let lost_raw = sample_raw("lost.jpg");
        let kept_final = sample_final("done.jpg");
        let lost_final = sample_final("gone.jpg");
        let lost_ids = vec![lost_raw.id(), lost_final.id()];

        let records = vec![
            ImageRecord::Raw(kept_raw),
            ImageRecord::Raw(lost_raw),
            ImageRecord::Final(kept_final),
            ImageRecord::Final(lost_final),
        ];
        let (repo, deleted) = paged_repository(records);
        let store = Arc::new(FakeImageStore::with_files(&[
            (StorageNamespace::Raw, "kept.jpg"),
            (StorageNamespace::Final, "done.jpg"),
        ]));

        let collector = OrphanedRecordCollector::new(Arc::new(repo), store.clone(), 3);
        let removed = collector.collect().await.unwrap();

        assert_eq!(removed, 2);
        let mut got = deleted.lock().clone();
        got.sort_by_key(|id| id.to_string());
        let mut want = lost_ids;
        want.sort_by_key(|id| id.to_string());
        assert_eq!(got, want);
        assert_eq!(store.deleted().len(), 2);
    }

    #[tokio::test]
    async fn test_collect_is_idempotent() {
        let store = Arc::new(FakeImageStore::with_files(&[(StorageNamespace::Final, "a.jpg")]));
        let (repo, deleted) = paged_repository(vec![ImageRecord::Final(sample_final("a.jpg"))]);

        let collector = OrphanedRecordCollector::new(Arc::new(repo), store, 10);
        assert_eq!(collector.collect().await.unwrap(), 0);
        assert_eq!(collector.collect().await.unwrap(), 0);
        assert!(deleted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_file_check_keeps_record() {
        let record = sample_final("flaky.jpg");
        let (repo, deleted) = paged_repository(vec![ImageRecord::Final(record)]);
        let store = Arc::new(FakeImageStore::failing_on("flaky.jpg"));

        let collector = OrphanedRecordCollector::new(Arc::new(repo), store, 10);
        let result = collector.collect().await;

        assert!(result.is_err());
        assert!(deleted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_is_reported() {
        let mut repo = MockImageRepository::new();
        repo.expect_list_page()
            .returning(|_, _| Err(RepositoryError::Internal("down".to_string())));

        let collector =
            OrphanedRecordCollector::new(Arc::new(repo), Arc::new(FakeImageStore::default()), 10);
        let err = collector.collect().await.unwrap_err();

        assert!(err.to_string().contains("candidates"));
    }
}
