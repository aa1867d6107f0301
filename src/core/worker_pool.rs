//! Bounded worker pool running zero-argument tasks on dedicated OS threads.
//!
//! The pool admits at most `worker_count` concurrently running tasks. Submission
//! hands the task straight to an idle worker over a rendezvous channel, so a
//! submitter blocks while every worker is busy. That blocking is the only
//! backpressure the puller applies to its pulling loop.
//!
//! # Example
//!
//! ```rust
//! use channel_puller::config::WorkerPoolConfig;
//! use channel_puller::core::WorkerPool;
//!
//! let pool = WorkerPool::new(WorkerPoolConfig::new().with_worker_count(2)).unwrap();
//! pool.submit(|| println!("hello from a worker")).unwrap();
//! pool.shutdown();
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has been shut down.
    PoolShutdown,

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (worker thread could not be spawned, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads, equal to the concurrency cap.
    pub worker_count: usize,

    /// Currently executing tasks.
    pub active_tasks: u64,

    /// Total tasks admitted by a worker.
    pub submitted_tasks: u64,

    /// Total tasks that returned normally.
    pub completed_tasks: u64,

    /// Total tasks that panicked.
    pub panicked_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub panicked_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            panicked_tasks: self.panicked_tasks.load(Ordering::Relaxed),
        }
    }
}

/// A unit of work accepted by the pool.
pub(crate) type PoolTask = Box<dyn FnOnce() + Send + 'static>;

pub use native::WorkerPool;
