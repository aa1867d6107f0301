//! Hands pulled items to the handler according to the dispatch mode.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::core::handler::{Control, HandlerFn, PanicHandlerFn};
use crate::core::panic_guard::guarded;
use crate::core::worker_pool::WorkerPool;

/// Dispatch strategy frozen at start.
pub(crate) enum Dispatcher<T> {
    /// Run inline; the handler's control outcome drives the loop.
    Inline(HandlerFn<T>),
    /// Detached thread per item.
    Detached {
        handler: HandlerFn<T>,
        panic_handler: Option<PanicHandlerFn>,
        thread_name: String,
        stack_size: usize,
    },
    /// Submit to a bounded pool; blocks while the pool is saturated.
    Pooled {
        handler: HandlerFn<T>,
        panic_handler: Option<PanicHandlerFn>,
        pool: Arc<WorkerPool>,
    },
}

impl<T> Dispatcher<T>
where
    T: Send + 'static,
{
    /// Dispatch one item. Asynchronous strategies always report `Control::PROCEED`.
    pub(crate) fn dispatch(&self, item: T) -> Control {
        match self {
            Self::Inline(handler) => handler(item),
            Self::Detached {
                handler,
                panic_handler,
                thread_name,
                stack_size,
            } => {
                // Shared so the task can still run inline if the thread never starts.
                let slot = Arc::new(Mutex::new(Some(isolated(
                    Arc::clone(handler),
                    panic_handler.clone(),
                    item,
                ))));
                let remote = Arc::clone(&slot);
                let spawned = thread::Builder::new()
                    .name(format!("{thread_name}-dispatch"))
                    .stack_size(*stack_size)
                    .spawn(move || {
                        let task = remote.lock().take();
                        if let Some(task) = task {
                            task();
                        }
                    });
                if let Err(e) = spawned {
                    warn!(error = %e, "Failed to spawn dispatch thread, running item inline");
                    let task = slot.lock().take();
                    if let Some(task) = task {
                        task();
                    }
                }
                Control::PROCEED
            }
            Self::Pooled {
                handler,
                panic_handler,
                pool,
            } => {
                let task = isolated(Arc::clone(handler), panic_handler.clone(), item);
                if let Err(e) = pool.submit(task) {
                    error!(error = %e, "Worker pool rejected item, item dropped");
                }
                Control::PROCEED
            }
        }
    }
}

/// Wrap one handler invocation so a panic is recovered and forwarded, never propagated.
fn isolated<T>(
    handler: HandlerFn<T>,
    panic_handler: Option<PanicHandlerFn>,
    item: T,
) -> impl FnOnce() + Send + 'static
where
    T: Send + 'static,
{
    move || {
        // Control outcome is meaningless once the loop has moved on.
        if let Err(recovered) = guarded(|| handler(item)) {
            debug!(panic = %recovered, "Recovered panic from asynchronous handler");
            if let Some(panic_handler) = panic_handler {
                panic_handler(recovered);
            }
        }
    }
}
