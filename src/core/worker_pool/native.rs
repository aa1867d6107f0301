//! Native implementation of `WorkerPool` using OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: Workers block on channel recv; submitters block on send
//! - **Rendezvous admission**: A zero-capacity channel means a task is only
//!   accepted once a worker is free to run it
//! - **Clean shutdown**: Dropping the sender unblocks idle workers naturally

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;

use super::{PoolCounters, PoolError, PoolStats, PoolTask};

/// How long `shutdown` waits for each worker before detaching it.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Worker pool with a fixed number of dedicated OS threads.
///
/// At most `worker_count` tasks run at once. Tasks already admitted keep
/// running after the pool is dropped; only `shutdown` waits for them.
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Task sender (to workers). Option allows clean shutdown by dropping.
    task_tx: Mutex<Option<Sender<PoolTask>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag (lock-free atomic).
    shutdown: AtomicBool,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a new worker pool and spawn `config.worker_count` worker threads.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid, or
    /// `PoolError::Internal` if a worker thread cannot be spawned.
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (task_tx, task_rx) = bounded::<PoolTask>(0);
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                worker_id,
                &config,
                task_rx.clone(),
                Arc::clone(&counters),
            )
            .map_err(|e| PoolError::Internal(format!("failed to spawn worker {worker_id}: {e}")))?;
            workers.push(worker);
        }

        info!(
            worker_count = config.worker_count,
            thread_name = %config.thread_name,
            "WorkerPool initialized"
        );

        Ok(Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
        })
    }

    /// Submit a task, blocking until a worker accepts it.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::PoolShutdown` if the pool has been shut down.
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }

        // Clone the sender so the lock is not held while blocked on a busy pool.
        let task_tx = {
            let guard = self.task_tx.lock();
            guard.as_ref().cloned().ok_or(PoolError::PoolShutdown)?
        };

        task_tx
            .send(Box::new(task))
            .map_err(|_| PoolError::PoolShutdown)?;
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Maximum number of concurrently running tasks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.worker_count
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Shut down the pool, waiting up to two seconds per worker for running tasks
    /// to finish. Workers that do not exit in time are detached.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");

        {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
        }

        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            let (tx, rx) = std::sync::mpsc::channel();
            let join_thread = thread::spawn(move || {
                let result = worker.join();
                let _ = tx.send(result.is_ok());
            });

            match rx.recv_timeout(JOIN_TIMEOUT) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }

            let _ = join_thread.join();
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Admitted tasks run to completion on their own; only idle workers are released here.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    config: &WorkerPoolConfig,
    task_rx: Receiver<PoolTask>,
    counters: Arc<PoolCounters>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name))
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            // recv fails once every sender is gone
            while let Ok(task) = task_rx.recv() {
                counters.active_tasks.fetch_add(1, Ordering::Relaxed);

                let outcome = panic::catch_unwind(AssertUnwindSafe(task));

                counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
                if outcome.is_ok() {
                    counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
                } else {
                    counters.panicked_tasks.fetch_add(1, Ordering::Relaxed);
                    warn!(worker_id = worker_id, "Worker task panicked");
                }
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}
