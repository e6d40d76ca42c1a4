//! # Concurrency Scheduler Module
//!
//! Questo modulo limita quante trasformazioni girano in parallelo.
//!
//! ## Responsabilità:
//! - Pool "normal" con cap = core logici disponibili (default)
//! - Coda singleton separata per gli invoker `Heavy` (guetzli): i formati
//!   leggeri dello stesso batch continuano a pieno parallelismo invece di
//!   essere strozzati dal dimezzamento dell'intero pool
//! - Join barrier sull'intero batch: il riepilogo esce solo a task finiti
//! - Isolamento: un task che fallisce o va in panic non cancella i fratelli
//!
//! Un task parte sempre dal pool normal; se il routing seleziona un invoker
//! `Heavy`, lo slot normal viene RILASCIATO prima di mettersi in coda sul
//! singleton, così i task pesanti in attesa non affamano il pool.

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::error;

use crate::invoker::ResourceClass;

/// Bounded two-queue scheduler, cheap to clone into every task.
#[derive(Clone)]
pub struct Scheduler {
    normal: Arc<Semaphore>,
    heavy: Arc<Semaphore>,
}

impl Scheduler {
    pub fn new(cap: usize) -> Self {
        Self {
            normal: Arc::new(Semaphore::new(cap.max(1))),
            heavy: Arc::new(Semaphore::new(1)),
        }
    }

    /// Default cap: one slot per logical CPU.
    pub fn with_default_cap() -> Self {
        Self::new(num_cpus::get())
    }

    /// Waits for a slot on the queue of the given class.
    pub async fn acquire(
        &self,
        class: ResourceClass,
    ) -> Result<OwnedSemaphorePermit, AcquireError> {
        let semaphore = match class {
            ResourceClass::Normal => Arc::clone(&self.normal),
            ResourceClass::Heavy => Arc::clone(&self.heavy),
        };
        semaphore.acquire_owned().await
    }

    /// Exchanges a held normal slot for the slot the selected invoker needs.
    /// The normal slot is released before queueing on the singleton.
    pub async fn slot_for(
        &self,
        class: ResourceClass,
        held: OwnedSemaphorePermit,
    ) -> Result<OwnedSemaphorePermit, AcquireError> {
        match class {
            ResourceClass::Normal => Ok(held),
            ResourceClass::Heavy => {
                drop(held);
                self.acquire(ResourceClass::Heavy).await
            }
        }
    }

    /// Spawns every task and joins the whole batch. Tasks are responsible
    /// for acquiring their own slot; outcomes travel through the reporter,
    /// so a finished batch has nothing to return.
    pub async fn run(&self, tasks: Vec<BoxFuture<'static, ()>>) {
        let handles: Vec<_> = tasks.into_iter().map(tokio::spawn).collect();

        for result in futures::future::join_all(handles).await {
            if let Err(join_error) = result {
                error!("Task aborted: {join_error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cap_bounds_in_flight_tasks() {
        let scheduler = Scheduler::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<BoxFuture<'static, ()>> = (0..10)
            .map(|_| {
                let scheduler = scheduler.clone();
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let _permit = scheduler.acquire(ResourceClass::Normal).await.unwrap();
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
                .boxed()
            })
            .collect();

        scheduler.run(tasks).await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_heavy_queue_is_a_singleton() {
        let scheduler = Scheduler::new(8);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<BoxFuture<'static, ()>> = (0..6)
            .map(|_| {
                let scheduler = scheduler.clone();
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let held = scheduler.acquire(ResourceClass::Normal).await.unwrap();
                    let _heavy = scheduler
                        .slot_for(ResourceClass::Heavy, held)
                        .await
                        .unwrap();
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
                .boxed()
            })
            .collect();

        scheduler.run(tasks).await;
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failing_task_never_blocks_siblings() {
        let scheduler = Scheduler::new(2);
        let completed = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<BoxFuture<'static, ()>> = (0..8)
            .map(|index| {
                let scheduler = scheduler.clone();
                let completed = Arc::clone(&completed);
                async move {
                    let _permit = scheduler.acquire(ResourceClass::Normal).await.unwrap();
                    if index == 3 {
                        panic!("engineered failure");
                    }
                    completed.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            })
            .collect();

        scheduler.run(tasks).await;
        assert_eq!(completed.load(Ordering::SeqCst), 7);
    }
}
