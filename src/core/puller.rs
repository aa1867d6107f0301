//! Long-running puller that consumes items from a channel or ticker.
//!
//! A [`Puller`] is configured with builder calls, then started once and stopped
//! once. Starting freezes the configuration and moves it onto a dedicated
//! pulling-loop thread; only the lifecycle state and the cancellation handle
//! stay behind the puller's mutex.
//!
//! # Example
//!
//! ```rust
//! use channel_puller::core::Puller;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, rx) = tokio::sync::mpsc::channel(16);
//!
//! let puller = Puller::new()
//!     .with_notify_source(rx)
//!     .with_handler(|item: u32| println!("handled {item}"))
//!     .with_async_bounded(4);
//!
//! puller.start_pull(&CancellationToken::new())?;
//! tx.send(1).await?;
//! puller.stop_pull(None).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DispatchMode, PullerOptions, WorkerPoolConfig};
use crate::core::dispatch::Dispatcher;
use crate::core::handler::{self, HandlerFn, PanicHandlerFn};
use crate::core::panic_guard::RecoveredPanic;
use crate::core::source::{ItemSource, MIN_TICK_PERIOD};
use crate::core::worker_pool::{PoolStats, WorkerPool};
use crate::core::PullerError;
use crate::runtime::spawn_dedicated;

/// Lifecycle of a puller. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullerState {
    /// Accepting builder calls; not yet pulling.
    Configured,
    /// `start_pull` has been called.
    Running,
    /// `stop_pull` has been called after start.
    Stopped,
}

/// Configuration gathered by builder calls before start.
struct Settings<T> {
    source: Option<ItemSource<T>>,
    handler: Option<HandlerFn<T>>,
    panic_handler: Option<PanicHandlerFn>,
    options: PullerOptions,
}

impl<T> Default for Settings<T> {
    fn default() -> Self {
        Self {
            source: None,
            handler: None,
            panic_handler: None,
            options: PullerOptions::default(),
        }
    }
}

struct Lifecycle<T> {
    state: PullerState,
    /// Present until a real pulling loop takes it.
    settings: Option<Settings<T>>,
    cancel: Option<CancellationToken>,
    pool: Option<Arc<WorkerPool>>,
    /// Pool statistics taken when the pool was released at stop.
    final_pool_stats: Option<PoolStats>,
}

/// Generic long-running puller dispatching items of type `T` to a handler.
///
/// Items come from exactly one source: a notify channel
/// ([`with_notify_source`](Self::with_notify_source)), a ticker owned by the
/// puller ([`with_ticker_source`](Self::with_ticker_source)), or a tick channel
/// owned by the application ([`with_tick_channel`](Self::with_tick_channel)).
///
/// Dispatch is synchronous by default: the handler runs on the pulling loop and
/// its [`Control`](crate::core::Control) outcome can stop the loop. In the
/// asynchronous modes the outcome is ignored and handler panics are isolated.
pub struct Puller<T> {
    id: Uuid,
    lifecycle: Mutex<Lifecycle<T>>,
}

impl<T> Default for Puller<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Puller<T>
where
    T: Send + 'static,
{
    /// Create an unconfigured puller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            lifecycle: Mutex::new(Lifecycle {
                state: PullerState::Configured,
                settings: Some(Settings::default()),
                cancel: None,
                pool: None,
                final_pool_stats: None,
            }),
        }
    }

    fn configure<F>(mut self, apply: F) -> Self
    where
        F: FnOnce(&mut Settings<T>),
    {
        let lifecycle = self.lifecycle.get_mut();
        match (lifecycle.state, lifecycle.settings.as_mut()) {
            (PullerState::Configured, Some(settings)) => apply(settings),
            (state, _) => warn!(puller_id = %self.id, ?state, "Ignoring configuration after start"),
        }
        self
    }

    /// Pull items pushed onto `rx`.
    #[must_use]
    pub fn with_notify_source(self, rx: mpsc::Receiver<T>) -> Self {
        self.configure(|settings| settings.source = Some(ItemSource::Notify(rx)))
    }

    /// On every tick of a ticker with the given `period`, synthesize an item by
    /// calling `produce` with the tick's timestamp. The first tick fires one
    /// period after start; the ticker is released when the puller stops.
    #[must_use]
    pub fn with_ticker_source<F>(self, period: Duration, produce: F) -> Self
    where
        F: FnMut(Instant) -> T + Send + 'static,
    {
        let id = self.id;
        self.configure(|settings| {
            let period = if period < MIN_TICK_PERIOD {
                warn!(puller_id = %id, ?period, "Ticker period too small, using 1ms");
                MIN_TICK_PERIOD
            } else {
                period
            };
            settings.source = Some(ItemSource::Ticker {
                period,
                produce: Box::new(produce),
            });
        })
    }

    /// On every tick received from `ticks`, synthesize an item by calling
    /// `produce` with the received timestamp.
    #[must_use]
    pub fn with_tick_channel<F>(self, ticks: mpsc::Receiver<Instant>, produce: F) -> Self
    where
        F: FnMut(Instant) -> T + Send + 'static,
    {
        self.configure(|settings| {
            settings.source = Some(ItemSource::TickChannel {
                ticks,
                produce: Box::new(produce),
            });
        })
    }

    /// Handle each item; the pulling loop always proceeds.
    #[must_use]
    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.configure(|settings| settings.handler = Some(handler::from_unit(handler)))
    }

    /// Handle each item; returning `true` skips the rest of the iteration.
    ///
    /// The returned value is ignored when dispatch is asynchronous.
    #[must_use]
    pub fn with_handler_skip<F>(self, handler: F) -> Self
    where
        F: Fn(T) -> bool + Send + Sync + 'static,
    {
        self.configure(|settings| settings.handler = Some(handler::from_skip(handler)))
    }

    /// Handle each item; returning `true` stops pulling.
    ///
    /// The returned value is ignored when dispatch is asynchronous.
    #[must_use]
    pub fn with_handler_stop<F>(self, handler: F) -> Self
    where
        F: Fn(T) -> bool + Send + Sync + 'static,
    {
        self.configure(|settings| settings.handler = Some(handler::from_stop(handler)))
    }

    /// Handle each item; the handler returns `(skip, stop)`. `stop` is checked first.
    ///
    /// Both values are ignored when dispatch is asynchronous.
    #[must_use]
    pub fn with_handler_skip_and_stop<F>(self, handler: F) -> Self
    where
        F: Fn(T) -> (bool, bool) + Send + Sync + 'static,
    {
        self.configure(|settings| {
            settings.handler = Some(handler::from_skip_and_stop(handler));
        })
    }

    /// Run the handler on a detached thread per item.
    #[must_use]
    pub fn with_async(self) -> Self {
        self.configure(|settings| settings.options.dispatch = DispatchMode::AsynchronousUnbounded)
    }

    /// Run the handler on a pool of `capacity` workers. When every worker is
    /// busy the pulling loop blocks until one frees up, which slows consumption
    /// instead of dropping items. A capacity of 0 is treated as 1.
    #[must_use]
    pub fn with_async_bounded(self, capacity: usize) -> Self {
        self.configure(|settings| {
            settings.options.dispatch = DispatchMode::AsynchronousPooled { capacity };
        })
    }

    /// Observe panics recovered from asynchronously dispatched handlers.
    /// Without an observer such panics are silently discarded.
    #[must_use]
    pub fn with_panic_handler<F>(self, panic_handler: F) -> Self
    where
        F: Fn(RecoveredPanic) + Send + Sync + 'static,
    {
        self.configure(|settings| settings.panic_handler = Some(Arc::new(panic_handler)))
    }

    /// Replace dispatch mode and thread settings in one call.
    #[must_use]
    pub fn with_options(self, options: PullerOptions) -> Self {
        self.configure(|settings| settings.options = options)
    }

    /// Identifier used in this puller's log records.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PullerState {
        self.lifecycle.lock().state
    }

    /// Statistics of the bounded worker pool, once a pooled puller has started.
    ///
    /// After [`stop_pull`](Self::stop_pull) this is the snapshot taken at stop.
    #[must_use]
    pub fn pool_stats(&self) -> Option<PoolStats> {
        let lifecycle = self.lifecycle.lock();
        lifecycle
            .pool
            .as_ref()
            .map(|pool| pool.stats())
            .or_else(|| lifecycle.final_pool_stats.clone())
    }

    /// Start pulling in the background and return immediately.
    ///
    /// The pulling loop stops when `parent` is cancelled, when
    /// [`stop_pull`](Self::stop_pull) is called, or when a synchronous handler
    /// asks to stop. Calling this again after the first call has no effect.
    /// Without a source or a handler the puller is marked running but nothing
    /// is pulled.
    ///
    /// # Errors
    ///
    /// Returns [`PullerError::Spawn`] if the pulling loop thread cannot be
    /// created, or [`PullerError::Pool`] if the worker pool cannot be built.
    /// The puller is left stopped in both cases.
    pub fn start_pull(&self, parent: &CancellationToken) -> Result<(), PullerError> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state != PullerState::Configured {
            debug!(puller_id = %self.id, state = ?lifecycle.state, "Puller already started");
            return Ok(());
        }
        lifecycle.state = PullerState::Running;

        let runnable = lifecycle
            .settings
            .as_ref()
            .is_some_and(|settings| settings.source.is_some() && settings.handler.is_some());
        if !runnable {
            warn!(puller_id = %self.id, "Puller has no source or handler, nothing will be pulled");
            lifecycle.cancel = Some(CancellationToken::new());
            return Ok(());
        }

        let Some(Settings {
            source: Some(source),
            handler: Some(handler),
            panic_handler,
            options,
        }) = lifecycle.settings.take()
        else {
            return Ok(());
        };

        let (dispatcher, pool) = match build_dispatcher(handler, panic_handler, &options) {
            Ok(built) => built,
            Err(e) => {
                lifecycle.state = PullerState::Stopped;
                return Err(e);
            }
        };

        let cancel = parent.child_token();
        let loop_cancel = cancel.clone();
        let id = self.id;
        let dispatch = options.dispatch.label();
        let source_kind = source.kind();

        let spawned = spawn_dedicated(options.thread_name.clone(), options.thread_stack_size, move || {
            pulling_loop(id, source, dispatcher, loop_cancel)
        });
        if let Err(e) = spawned {
            lifecycle.state = PullerState::Stopped;
            return Err(PullerError::Spawn(format!("pulling loop thread: {e}")));
        }

        lifecycle.cancel = Some(cancel);
        lifecycle.pool = pool;
        info!(puller_id = %id, dispatch, source = source_kind, "Puller started");
        Ok(())
    }

    /// Stop pulling.
    ///
    /// Issues the cancellation signal and returns without waiting for the
    /// pulling loop to exit or for in-flight asynchronous handlers to finish.
    /// A bounded worker pool is released here; its workers exit once the loop
    /// lets go of it and their running handlers return. Calling this before
    /// start, or a second time, returns `Ok(())` with no effect.
    ///
    /// # Errors
    ///
    /// Returns [`PullerError::StopTimeout`] if issuing the cancellation does
    /// not complete within `timeout`. Cancelling never waits, so in practice
    /// this does not happen, even with a zero timeout.
    pub async fn stop_pull(&self, timeout: Option<Duration>) -> Result<(), PullerError> {
        let cancel = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != PullerState::Running {
                return Ok(());
            }
            lifecycle.state = PullerState::Stopped;
            if let Some(pool) = lifecycle.pool.take() {
                lifecycle.final_pool_stats = Some(pool.stats());
            }
            lifecycle.cancel.take()
        };

        let Some(cancel) = cancel else {
            return Ok(());
        };

        let invoke = async move { cancel.cancel() };
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, invoke)
                .await
                .map_err(|_| PullerError::StopTimeout { timeout })?,
            None => invoke.await,
        }

        info!(puller_id = %self.id, "Puller stopped");
        Ok(())
    }
}

impl<T> Drop for Puller<T> {
    fn drop(&mut self) {
        // An abandoned running puller must not leave its loop thread behind.
        if let Some(cancel) = self.lifecycle.get_mut().cancel.take() {
            cancel.cancel();
        }
    }
}

fn build_dispatcher<T>(
    handler: HandlerFn<T>,
    panic_handler: Option<PanicHandlerFn>,
    options: &PullerOptions,
) -> Result<(Dispatcher<T>, Option<Arc<WorkerPool>>), PullerError>
where
    T: Send + 'static,
{
    match options.dispatch {
        DispatchMode::Synchronous => Ok((Dispatcher::Inline(handler), None)),
        DispatchMode::AsynchronousUnbounded => Ok((
            Dispatcher::Detached {
                handler,
                panic_handler,
                thread_name: options.thread_name.clone(),
                stack_size: options.thread_stack_size,
            },
            None,
        )),
        DispatchMode::AsynchronousPooled { capacity } => {
            if capacity == 0 {
                warn!(capacity, "Pool capacity 0 requested, using 1");
            }
            let config = WorkerPoolConfig::new()
                .with_worker_count(capacity.max(1))
                .with_thread_stack_size(options.thread_stack_size)
                .with_thread_name(format!("{}-worker", options.thread_name));
            let pool = Arc::new(WorkerPool::new(config)?);
            Ok((
                Dispatcher::Pooled {
                    handler,
                    panic_handler,
                    pool: Arc::clone(&pool),
                },
                Some(pool),
            ))
        }
    }
}

/// Wait on cancellation and the source, dispatching each item until cancelled
/// or a synchronous handler asks to stop.
///
/// A closed notify or tick channel does not end the loop: the source is simply
/// no longer polled, and the loop keeps waiting for cancellation.
async fn pulling_loop<T>(
    id: Uuid,
    source: ItemSource<T>,
    dispatcher: Dispatcher<T>,
    cancel: CancellationToken,
) where
    T: Send + 'static,
{
    let mut source = source.activate();
    let mut exhausted = false;
    debug!(puller_id = %id, "Pulling loop started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(puller_id = %id, "Pulling loop cancelled");
                break;
            }
            next = source.next(), if !exhausted => {
                let Some(item) = next else {
                    exhausted = true;
                    debug!(puller_id = %id, "Source closed, waiting for cancellation");
                    continue;
                };

                let control = dispatcher.dispatch(item);
                if control.stop {
                    info!(puller_id = %id, "Handler requested stop");
                    break;
                }
                if control.skip {
                    debug!(puller_id = %id, "Handler skipped rest of iteration");
                }
            }
        }
    }

    if source.owns_ticker() {
        debug!(puller_id = %id, "Releasing owned ticker");
    }
}
