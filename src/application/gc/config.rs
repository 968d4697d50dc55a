use std::time::Duration;

/// Configuration for the maintenance sweep
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// How often to run a sweep
    pub interval: Duration,
    /// Records fetched per page while checking backing files
    pub batch_size: i64,
    /// Upload sessions idle for longer than this are reclaimed
    pub upload_session_ttl: Duration,
    /// How often to reclaim stale uploads (relative to main interval)
    pub stale_upload_cleanup_multiplier: u32,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            batch_size: 100,
            upload_session_ttl: Duration::from_secs(3600),
            stale_upload_cleanup_multiplier: 4,
        }
    }
}

impl GcConfig {
    pub fn new(interval: Duration, batch_size: i64, upload_session_ttl: Duration) -> Self {
        Self {
            interval,
            batch_size,
            upload_session_ttl,
            ..Self::default()
        }
    }

    pub fn stale_upload_cleanup_interval(&self) -> Duration {
        self.interval * self.stale_upload_cleanup_multiplier
    }
}
