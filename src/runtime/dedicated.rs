//! Dedicated OS thread driving a single future on its own current-thread runtime.

use std::future::Future;
use std::io;
use std::thread::{self, JoinHandle};

use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Spawn a named thread that blocks on the future returned by `make_future`,
/// driven by a current-thread tokio runtime owned by that thread.
///
/// The runtime is built before the thread is spawned, so both failures are
/// reported to the caller. The future itself is constructed on the new thread,
/// inside the runtime, so it may register timers while being built.
///
/// # Errors
///
/// Returns the I/O error if the runtime cannot be built or the OS refuses to
/// create the thread.
pub fn spawn_dedicated<F, Fut>(
    name: String,
    stack_size: usize,
    make_future: F,
) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    spawn_with_runtime(
        || Builder::new_current_thread().enable_all().build(),
        name,
        stack_size,
        make_future,
    )
}

fn spawn_with_runtime<B, F, Fut>(
    build: B,
    name: String,
    stack_size: usize,
    make_future: F,
) -> io::Result<JoinHandle<()>>
where
    B: FnOnce() -> io::Result<Runtime>,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    let rt = OwnedRuntime(Some(build()?));

    thread::Builder::new()
        .name(name)
        .stack_size(stack_size)
        .spawn(move || {
            if let Some(runtime) = &rt.0 {
                debug!("Dedicated runtime started");
                runtime.block_on(async move { make_future().await });
                debug!("Dedicated runtime finished");
            }
        })
}

/// Runtime released without blocking, so it can be dropped from async code
/// when the thread that should have owned it fails to spawn.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}
