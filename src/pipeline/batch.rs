// src/pipeline/batch.rs

//! Batched execution of follow-up fetch tasks.
//!
//! Splits per-course detail fetches into fixed-size groups, runs each group
//! concurrently, waits for the whole group to settle and sleeps a configured
//! delay between groups. With batching disabled, tasks run strictly one at a
//! time with a per-item delay. The pair of delays is what rate-limits the
//! crawl against the source site.
//!
//! The sleep function is injected so tests exercise the batching logic
//! without wall-clock delay.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture};

use crate::models::{BatchingConfig, DelayConfig};

/// Injectable sleep function.
pub type SleepFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Real sleep backed by the tokio timer.
pub fn tokio_sleep() -> SleepFn {
    Arc::new(|duration| Box::pin(tokio::time::sleep(duration)))
}

/// Runs groups of follow-up tasks with fixed inter-group delays.
#[derive(Clone)]
pub struct BatchScheduler {
    batching: BatchingConfig,
    batch_delay: Duration,
    item_delay: Duration,
    sleep: SleepFn,
}

impl BatchScheduler {
    pub fn new(batching: &BatchingConfig, delays: &DelayConfig, sleep: SleepFn) -> Self {
        Self {
            batching: batching.clone(),
            batch_delay: Duration::from_millis(delays.between_batches_ms),
            item_delay: Duration::from_millis(delays.between_subjects_ms),
            sleep,
        }
    }

    /// Run all tasks, preserving input order in the results.
    ///
    /// A task signals failure by resolving to `None`; one failed task never
    /// aborts its group or the run. Group results are collected only after
    /// the whole group settles.
    pub async fn run_all<T, Fut>(&self, tasks: Vec<Fut>) -> Vec<Option<T>>
    where
        Fut: Future<Output = Option<T>>,
    {
        if self.batching.enabled {
            self.run_batched(tasks).await
        } else {
            self.run_sequential(tasks).await
        }
    }

    async fn run_batched<T, Fut>(&self, tasks: Vec<Fut>) -> Vec<Option<T>>
    where
        Fut: Future<Output = Option<T>>,
    {
        let total = tasks.len();
        let size = self.batching.batch_size.max(1);
        let mut results = Vec::with_capacity(total);
        let mut iter = tasks.into_iter();

        while results.len() < total {
            let group: Vec<_> = iter.by_ref().take(size).collect();
            results.extend(future::join_all(group).await);

            // No delay after the final group.
            if results.len() < total && !self.batch_delay.is_zero() {
                (self.sleep)(self.batch_delay).await;
            }
        }
        results
    }

    async fn run_sequential<T, Fut>(&self, tasks: Vec<Fut>) -> Vec<Option<T>>
    where
        Fut: Future<Output = Option<T>>,
    {
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(task.await);
            if !self.item_delay.is_zero() {
                (self.sleep)(self.item_delay).await;
            }
        }
        results
    }
}
