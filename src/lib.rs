//! # Channel Puller
//!
//! A configurable, long-running consumer that pulls items from a channel or a
//! ticker and hands them to a handler.
//!
//! The [`Puller`](core::Puller) owns one background pulling loop. The loop waits
//! on cancellation and on the next item, then dispatches the item synchronously,
//! on a detached thread, or through a bounded worker pool. Panics raised by
//! asynchronously dispatched handlers are isolated and can be observed through
//! a panic handler.
//!
//! ## Key Features
//!
//! - **Two source kinds**: push-style notify channels, and tickers that synthesize
//!   an item per tick (owned by the puller or driven by an external tick channel)
//! - **Four handler shapes**: no outcome, skip, stop, or skip-and-stop, all
//!   normalized to one [`Control`](core::Control) outcome
//! - **Three dispatch modes**: synchronous, unbounded asynchronous, and pooled
//!   asynchronous with backpressure on the pulling loop
//! - **Panic isolation**: recovered panics carry message, location and backtrace
//! - **Idempotent lifecycle**: start and stop are safe to call more than once
//!
//! ## Example
//!
//! ```rust,ignore
//! use channel_puller::core::Puller;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(32);
//!
//! let puller = Puller::new()
//!     .with_notify_source(rx)
//!     .with_handler_stop(|order: Order| process(order).is_fatal())
//!     .with_async_bounded(8)
//!     .with_panic_handler(|recovered| tracing::error!(%recovered, "order handler panicked"));
//!
//! puller.start_pull(&CancellationToken::new())?;
//! // ... push orders with tx.send(order).await ...
//! puller.stop_pull(Some(Duration::from_secs(1))).await?;
//! ```
//!
//! For complete examples, see:
//! - `tests/puller_test.rs` - Dispatch modes and lifecycle
//! - `tests/ticker_test.rs` - Ticker sources

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pulling, dispatch, and panic-isolation abstractions.
pub mod core;
/// Configuration models for pullers and worker pools.
pub mod config;
/// Builders to construct pullers from configuration.
pub mod builders;
/// Runtime adapters for the pulling loop.
pub mod runtime;
/// Shared utilities.
pub mod util;
