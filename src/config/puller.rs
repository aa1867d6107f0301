//! Puller and worker pool configuration structures.

use serde::{Deserialize, Serialize};

/// Default name given to the pulling loop thread.
pub const DEFAULT_THREAD_NAME: &str = "puller";

/// Default stack size for puller-owned threads (2 MiB).
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// How pulled items are handed to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum DispatchMode {
    /// Handler runs inline on the pulling loop; its control outcome is honored.
    #[default]
    Synchronous,
    /// One detached thread per item; control outcome is ignored.
    AsynchronousUnbounded,
    /// Items are submitted to a bounded worker pool; submission blocks at capacity.
    AsynchronousPooled {
        /// Maximum number of concurrently running handler invocations.
        capacity: usize,
    },
}

impl DispatchMode {
    /// Whether handler invocations leave the pulling loop.
    #[must_use]
    pub const fn is_async(&self) -> bool {
        !matches!(self, Self::Synchronous)
    }

    /// Short label used in log fields.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Synchronous => "sync",
            Self::AsynchronousUnbounded => "async",
            Self::AsynchronousPooled { .. } => "async_bounded",
        }
    }
}

/// Puller runtime options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullerOptions {
    /// Dispatch mode for pulled items.
    pub dispatch: DispatchMode,
    /// Name of the pulling loop thread; dispatch threads derive theirs from it.
    pub thread_name: String,
    /// Stack size in bytes for the pulling loop and dispatch threads.
    pub thread_stack_size: usize,
}

impl Default for PullerOptions {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::default(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl PullerOptions {
    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if let DispatchMode::AsynchronousPooled { capacity: 0 } = self.dispatch {
            return Err("pool capacity must be greater than 0".into());
        }
        if self.thread_name.is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse options from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let options: Self =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        options.validate()?;
        Ok(options)
    }

    /// Build options from `PULLER_*` environment variables, loading a `.env` file first
    /// when one is present. Unset variables keep their defaults.
    ///
    /// Recognized variables: `PULLER_DISPATCH` (`sync`, `async`, `async_bounded`),
    /// `PULLER_POOL_CAPACITY`, `PULLER_THREAD_NAME`, `PULLER_THREAD_STACK_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns a message for unknown dispatch names, unparsable numbers, or invalid values.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build options from an arbitrary key lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        let capacity = lookup("PULLER_POOL_CAPACITY")
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .map_err(|e| format!("PULLER_POOL_CAPACITY `{raw}`: {e}"))
            })
            .transpose()?;

        if let Some(dispatch) = lookup("PULLER_DISPATCH") {
            options.dispatch = match dispatch.trim() {
                "sync" | "synchronous" => DispatchMode::Synchronous,
                "async" | "asynchronous" => DispatchMode::AsynchronousUnbounded,
                "async_bounded" | "pooled" => DispatchMode::AsynchronousPooled {
                    capacity: capacity.unwrap_or_else(num_cpus::get),
                },
                other => return Err(format!("unknown PULLER_DISPATCH `{other}`")),
            };
        }

        if let Some(name) = lookup("PULLER_THREAD_NAME") {
            options.thread_name = name;
        }

        if let Some(raw) = lookup("PULLER_THREAD_STACK_SIZE") {
            options.thread_stack_size = raw
                .trim()
                .parse()
                .map_err(|e| format!("PULLER_THREAD_STACK_SIZE `{raw}`: {e}"))?;
        }

        options.validate()?;
        Ok(options)
    }
}

/// Bounded worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads, which is also the concurrency cap.
    pub worker_count: usize,
    /// Stack size in bytes for each worker thread.
    pub thread_stack_size: usize,
    /// Prefix for worker thread names; workers are named `{prefix}-{id}`.
    pub thread_name: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
            thread_name: "pool-worker".to_string(),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with one worker per logical CPU.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }
}
