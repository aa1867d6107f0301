//! Panic isolation for asynchronously dispatched handlers.
//!
//! [`guarded`] runs a task body under `catch_unwind` and converts a panic into a
//! [`RecoveredPanic`]. A process-wide panic hook, installed once, records the
//! panic location and a backtrace of the panicking frame while a guarded body is
//! running on the current thread, and keeps the default panic message quiet for
//! those panics. Panics outside a guarded body reach the previous hook unchanged.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use parking_lot::Once;

static HOOK: Once = Once::new();

thread_local! {
    static GUARDED: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// Where a guarded panic was raised.
struct PanicSite {
    location: Option<String>,
    backtrace: Backtrace,
}

/// Captured value and stack information from an isolated handler panic.
pub struct RecoveredPanic {
    message: String,
    payload: Box<dyn Any + Send + 'static>,
    location: Option<String>,
    thread: Option<String>,
    backtrace: Backtrace,
}

impl RecoveredPanic {
    fn new(payload: Box<dyn Any + Send + 'static>, site: Option<PanicSite>) -> Self {
        let message = payload_message(payload.as_ref());
        let (location, backtrace) = match site {
            Some(site) => (site.location, site.backtrace),
            None => (None, Backtrace::capture()),
        };

        Self {
            message,
            payload,
            location,
            thread: thread::current().name().map(str::to_owned),
            backtrace,
        }
    }

    /// Panic message, or a placeholder when the payload is not a string.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `file:line:column` of the `panic!` call, when known.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Name of the thread the handler panicked on.
    #[must_use]
    pub fn thread(&self) -> Option<&str> {
        self.thread.as_deref()
    }

    /// Backtrace captured at the panic site.
    #[must_use]
    pub const fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Original panic payload, suitable for `std::panic::resume_unwind`.
    #[must_use]
    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }
}

impl fmt::Debug for RecoveredPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveredPanic")
            .field("message", &self.message)
            .field("location", &self.location)
            .field("thread", &self.thread)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RecoveredPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "handler panicked at {location}: {}", self.message),
            None => write!(f, "handler panicked: {}", self.message),
        }
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARDED.with(Cell::get) {
                let site = PanicSite {
                    location: info.location().map(ToString::to_string),
                    backtrace: Backtrace::force_capture(),
                };
                CAPTURED.with(|captured| *captured.borrow_mut() = Some(site));
                return;
            }
            previous(info);
        }));
    });
}

/// Resets the guard flag even if the body unwinds.
struct GuardScope {
    was_guarded: bool,
}

impl GuardScope {
    fn enter() -> Self {
        Self {
            was_guarded: GUARDED.with(|guarded| guarded.replace(true)),
        }
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        GUARDED.with(|guarded| guarded.set(self.was_guarded));
    }
}

/// Run `body`, returning the recovered panic if it unwound.
///
/// # Errors
///
/// Returns the [`RecoveredPanic`] describing the panic raised by `body`.
pub fn guarded<F, R>(body: F) -> Result<R, RecoveredPanic>
where
    F: FnOnce() -> R,
{
    install_hook();
    // A site left by a panic caught inside an earlier body must not be reported
    // for a panic that never reaches the hook, such as `resume_unwind`.
    CAPTURED.with(|captured| captured.borrow_mut().take());

    let outcome = {
        let _scope = GuardScope::enter();
        panic::catch_unwind(AssertUnwindSafe(body))
    };

    outcome.map_err(|payload| {
        let site = CAPTURED.with(|captured| captured.borrow_mut().take());
        RecoveredPanic::new(payload, site)
    })
}
