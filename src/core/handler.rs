//! Canonical handler shape and the adapters that normalize simpler shapes into it.

use std::sync::Arc;

use crate::core::panic_guard::RecoveredPanic;

/// Control outcome of one synchronous handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Control {
    /// Skip the rest of the current iteration and wait for the next item.
    pub skip: bool,
    /// Stop pulling; no further items are consumed.
    pub stop: bool,
}

impl Control {
    /// Keep pulling.
    pub const PROCEED: Self = Self { skip: false, stop: false };
    /// Skip the rest of this iteration.
    pub const SKIP: Self = Self { skip: true, stop: false };
    /// Stop the pulling loop.
    pub const STOP: Self = Self { skip: false, stop: true };
}

impl From<(bool, bool)> for Control {
    fn from((skip, stop): (bool, bool)) -> Self {
        Self { skip, stop }
    }
}

/// Handler in canonical form, shared between the loop and dispatch threads.
pub(crate) type HandlerFn<T> = Arc<dyn Fn(T) -> Control + Send + Sync + 'static>;

/// Observer for panics recovered from asynchronous dispatch.
pub(crate) type PanicHandlerFn = Arc<dyn Fn(RecoveredPanic) + Send + Sync + 'static>;

pub(crate) fn from_unit<T, F>(handler: F) -> HandlerFn<T>
where
    F: Fn(T) + Send + Sync + 'static,
{
    Arc::new(move |item| {
        handler(item);
        Control::PROCEED
    })
}

pub(crate) fn from_skip<T, F>(handler: F) -> HandlerFn<T>
where
    F: Fn(T) -> bool + Send + Sync + 'static,
{
    Arc::new(move |item| Control {
        skip: handler(item),
        stop: false,
    })
}

pub(crate) fn from_stop<T, F>(handler: F) -> HandlerFn<T>
where
    F: Fn(T) -> bool + Send + Sync + 'static,
{
    Arc::new(move |item| Control {
        skip: false,
        stop: handler(item),
    })
}

pub(crate) fn from_skip_and_stop<T, F>(handler: F) -> HandlerFn<T>
where
    F: Fn(T) -> (bool, bool) + Send + Sync + 'static,
{
    Arc::new(move |item| Control::from(handler(item)))
}
