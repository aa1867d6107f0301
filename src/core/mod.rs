//! Core pulling, dispatch, and panic-isolation abstractions.

pub(crate) mod dispatch;
pub mod error;
pub mod handler;
pub mod panic_guard;
pub mod puller;
pub(crate) mod source;
pub mod worker_pool;

pub use error::{AppResult, PullerError};
pub use handler::Control;
pub use panic_guard::{guarded, RecoveredPanic};
pub use puller::{Puller, PullerState};
pub use worker_pool::{PoolError, PoolStats, WorkerPool};
