//! Stress helpers for EntiKV.
//!
//! These drive many concurrent read-merge-write cycles at one record and
//! report how many updates applied and how many gave up.

use crate::fixtures::Counter;
use entikv_core::{Collection, CoreError, Patch};
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total updates attempted.
    pub total_ops: usize,
    /// Updates that reported success.
    pub successful_ops: usize,
    /// Updates abandoned after exhausting their retries.
    pub conflicted_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, conflicted: usize, duration: Duration) -> Self {
        Self {
            total_ops: successful + conflicted,
            successful_ops: successful,
            conflicted_ops: conflicted,
            duration,
        }
    }

    /// Operations per second.
    pub fn ops_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_ops as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent tasks.
    pub tasks: usize,
    /// Updates issued by each task.
    pub updates_per_task: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            tasks: 4,
            updates_per_task: 25,
        }
    }
}

impl StressConfig {
    /// Creates a quick config for unit tests.
    pub fn quick() -> Self {
        Self {
            tasks: 2,
            updates_per_task: 10,
        }
    }
}

/// Increments counter `id` from `config.tasks` tasks at once.
///
/// The counter must already exist. Errors other than an exhausted update
/// fail the run.
pub async fn concurrent_increments(
    collection: &Collection<Counter>,
    id: u64,
    config: &StressConfig,
) -> Result<StressTestResult, CoreError> {
    let start = Instant::now();

    let handles: Vec<_> = (0..config.tasks)
        .map(|_| {
            let collection = collection.clone();
            let updates = config.updates_per_task;
            tokio::spawn(async move {
                let mut applied = 0;
                let mut conflicted = 0;
                for _ in 0..updates {
                    let result = collection
                        .update_with(&id, |c: &Counter| Patch::new().set("hits", c.hits + 1))
                        .await;
                    match result {
                        Ok(_) => applied += 1,
                        Err(CoreError::UpdateConflict { .. }) => conflicted += 1,
                        Err(err) => return Err(err),
                    }
                }
                Ok((applied, conflicted))
            })
        })
        .collect();

    let mut successful = 0;
    let mut conflicted = 0;
    for handle in handles {
        let (applied, lost) = handle.await.expect("Stress task panicked")?;
        successful += applied;
        conflicted += lost;
    }

    Ok(StressTestResult::new(successful, conflicted, start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::counters;
    use entikv_storage::InMemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn sequential_increments_all_apply() {
        let coll = counters(Arc::new(InMemoryStore::new()), 3);
        coll.set(&Counter { id: 1, hits: 0 }).await.unwrap();

        let config = StressConfig {
            tasks: 1,
            updates_per_task: 5,
        };
        let result = concurrent_increments(&coll, 1, &config).await.unwrap();

        assert_eq!(result.successful_ops, 5);
        assert_eq!(result.conflicted_ops, 0);
        assert_eq!(coll.get(&1u64).await.unwrap().unwrap().hits, 5);
    }
}
