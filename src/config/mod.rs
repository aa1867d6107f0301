//! Configuration models for pullers and worker pools.

pub mod puller;

pub use puller::{
    DispatchMode, PullerOptions, WorkerPoolConfig, DEFAULT_THREAD_NAME, DEFAULT_THREAD_STACK_SIZE,
};
