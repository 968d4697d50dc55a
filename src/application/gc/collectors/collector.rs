/// One kind of cleanup run by the [`GarbageCollector`](crate::application::gc::GarbageCollector).
///
/// Implementations must be idempotent: running the same collector twice in
/// a row removes nothing the second time.
#[async_trait::async_trait]
pub trait Collector {
    /// Unique snake_case name, used in logs and to route counts into `GcResult`
    fn name(&self) -> &'static str;

    /// Runs one cycle and returns the number of items removed
    async fn collect(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>>;
}
