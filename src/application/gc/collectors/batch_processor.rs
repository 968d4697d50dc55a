use std::future::Future;

use futures_util::future::join_all;

/// Configuration for batch processing operations
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// How many items are in flight at once
    pub concurrent_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrent_batch_size: 10,
        }
    }
}

/// An item together with what processing it produced
#[derive(Debug)]
pub struct BatchItemResult<T, R = ()> {
    pub item: T,
    pub result: R,
}

/// Runs an async operation over many items, a bounded number at a time.
///
/// Results come back in input order.
pub struct BatchProcessor;

impl BatchProcessor {
    pub async fn process_concurrent<F, Fut, T, R>(
        items: Vec<T>,
        config: &BatchConfig,
        processor: F,
    ) -> Vec<BatchItemResult<T, R>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
        T: Clone,
    {
        let width = config.concurrent_batch_size.max(1);
        let mut results = Vec::with_capacity(items.len());

        for chunk in items.chunks(width) {
            let outcomes = join_all(chunk.iter().cloned().map(&processor)).await;
            results.extend(
                chunk
                    .iter()
                    .cloned()
                    .zip(outcomes)
                    .map(|(item, result)| BatchItemResult { item, result }),
            );
        }

        results
    }
}
