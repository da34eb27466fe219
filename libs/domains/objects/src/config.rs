/// Tunables for the lifecycle manager.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Upper bound on concurrently running vectorization calls within one
    /// batch. Writes stay sequential under the batch-held lock regardless.
    pub batch_vectorize_concurrency: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            batch_vectorize_concurrency: 8,
        }
    }
}

impl LifecycleConfig {
    pub fn from_env() -> Self {
        let batch_vectorize_concurrency = std::env::var("OBJECTS_BATCH_VECTORIZE_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(8);

        Self {
            batch_vectorize_concurrency,
        }
    }

    pub fn with_batch_vectorize_concurrency(mut self, limit: usize) -> Self {
        self.batch_vectorize_concurrency = limit.max(1);
        self
    }
}
