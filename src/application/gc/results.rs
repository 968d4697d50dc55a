/// Result of one complete sweep
#[derive(Debug, Default, Clone)]
pub struct GcResult {
    /// Sum of all specific counts
    pub total_deleted: usize,
    /// Records removed because their backing file was gone
    pub orphaned_records_deleted: usize,
    /// Upload sessions and unclaimed uploads reclaimed
    pub stale_uploads_reclaimed: usize,
    /// One entry per failed collector; the sweep keeps going after a failure
    pub errors: Vec<String>,
}

impl GcResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_deletions(&self) -> bool {
        self.total_deleted > 0
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn merge(&mut self, other: GcResult) {
        self.total_deleted += other.total_deleted;
        self.orphaned_records_deleted += other.orphaned_records_deleted;
        self.stale_uploads_reclaimed += other.stale_uploads_reclaimed;
        self.errors.extend(other.errors);
    }

    pub fn summary(&self) -> String {
        let counts = format!(
            "{} total deleted ({} orphaned records, {} stale uploads)",
            self.total_deleted, self.orphaned_records_deleted, self.stale_uploads_reclaimed
        );
        if self.errors.is_empty() {
            format!("Sweep completed successfully: {}", counts)
        } else {
            format!("Sweep completed with {} errors: {}", self.errors.len(), counts)
        }
    }
}

/// Running totals across sweeps
#[derive(Debug, Clone, Default)]
pub struct GcStatistics {
    pub cycles_completed: usize,
    pub total_items_deleted: usize,
    pub total_orphaned_records_deleted: usize,
    pub total_stale_uploads_reclaimed: usize,
    pub total_errors: usize,
}

impl GcStatistics {
    pub fn update(&mut self, result: &GcResult) {
        self.cycles_completed += 1;
        self.total_items_deleted += result.total_deleted;
        self.total_orphaned_records_deleted += result.orphaned_records_deleted;
        self.total_stale_uploads_reclaimed += result.stale_uploads_reclaimed;
        self.total_errors += result.errors.len();
    }

    pub fn average_deletions_per_cycle(&self) -> f64 {
        if self.cycles_completed == 0 {
            0.0
        } else {
            self.total_items_deleted as f64 / self.cycles_completed as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gc_result_is_success() {
        let mut result = GcResult::new();
        assert!(result.is_success());

        result.add_error("Test error");
        assert!(!result.is_success());
    }

    #[test]
    fn test_gc_result_merge() {
        let mut first = GcResult {
            total_deleted: 5,
            orphaned_records_deleted: 3,
            stale_uploads_reclaimed: 2,
            errors: vec!["error1".to_string()],
        };
        let second = GcResult {
            total_deleted: 3,
            orphaned_records_deleted: 2,
            stale_uploads_reclaimed: 1,
            errors: vec!["error2".to_string()],
        };

        first.merge(second);

        assert_eq!(first.total_deleted, 8);
        assert_eq!(first.orphaned_records_deleted, 5);
        assert_eq!(first.stale_uploads_reclaimed, 3);
        assert_eq!(first.errors.len(), 2);
    }

    #[test]
    fn test_gc_result_summary() {
        let result = GcResult {
            total_deleted: 10,
            orphaned_records_deleted: 7,
            stale_uploads_reclaimed: 3,
            errors: vec![],
        };

        let summary = result.summary();
        assert!(summary.contains("10 total deleted"));
        assert!(summary.contains("7 orphaned records"));
        assert!(summary.contains("3 stale uploads"));
    }

    #[test]
    fn test_gc_statistics_update() {
        let mut stats = GcStatistics::default();
        assert_eq!(stats.average_deletions_per_cycle(), 0.0);

        stats.update(&GcResult {
            total_deleted: 4,
            orphaned_records_deleted: 3,
            stale_uploads_reclaimed: 1,
            errors: vec!["error".to_string()],
        });
        stats.update(&GcResult::new());

        assert_eq!(stats.cycles_completed, 2);
        assert_eq!(stats.total_items_deleted, 4);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.average_deletions_per_cycle(), 2.0);
    }
}
