//! Item sources a puller can pull from.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Synthesizes an item from a tick timestamp.
pub(crate) type ProduceFn<T> = Box<dyn FnMut(Instant) -> T + Send + 'static>;

/// Smallest period accepted for an owned ticker.
pub(crate) const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Configured item source, moved into the pulling loop at start.
pub(crate) enum ItemSource<T> {
    /// Items pushed onto a channel by the application.
    Notify(mpsc::Receiver<T>),
    /// Ticker created and owned by the puller.
    Ticker {
        period: Duration,
        produce: ProduceFn<T>,
    },
    /// Ticks delivered by the application on a channel.
    TickChannel {
        ticks: mpsc::Receiver<Instant>,
        produce: ProduceFn<T>,
    },
}

impl<T> ItemSource<T> {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Notify(_) => "notify",
            Self::Ticker { .. } => "ticker",
            Self::TickChannel { .. } => "tick_channel",
        }
    }

    /// Bind the source to the current runtime. Must be called from within it,
    /// since an owned ticker registers its timer here.
    pub(crate) fn activate(self) -> ActiveSource<T> {
        match self {
            Self::Notify(rx) => ActiveSource::Notify(rx),
            Self::Ticker { period, produce } => {
                // First tick one period after start, and a slow handler drops ticks
                // rather than bursting to catch up.
                let mut interval = time::interval_at(time::Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ActiveSource::Ticker { interval, produce }
            }
            Self::TickChannel { ticks, produce } => ActiveSource::TickChannel { ticks, produce },
        }
    }
}

/// Source bound to the pulling loop's runtime.
pub(crate) enum ActiveSource<T> {
    Notify(mpsc::Receiver<T>),
    Ticker {
        interval: Interval,
        produce: ProduceFn<T>,
    },
    TickChannel {
        ticks: mpsc::Receiver<Instant>,
        produce: ProduceFn<T>,
    },
}

impl<T> ActiveSource<T> {
    /// Wait for the next item. `None` means the upstream channel closed and no
    /// further items will arrive.
    pub(crate) async fn next(&mut self) -> Option<T> {
        match self {
            Self::Notify(rx) => rx.recv().await,
            Self::Ticker { interval, produce } => {
                let at = interval.tick().await;
                Some(produce(at.into_std()))
            }
            Self::TickChannel { ticks, produce } => ticks.recv().await.map(|at| produce(at)),
        }
    }

    pub(crate) const fn owns_ticker(&self) -> bool {
        matches!(self, Self::Ticker { .. })
    }
}
