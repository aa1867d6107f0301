//! Tests for builder modules

use channel_puller::builders::build_puller;
use channel_puller::config::{DispatchMode, PullerOptions};
use channel_puller::core::{PullerError, PullerState};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[test]
fn test_build_puller_with_valid_options() {
    let options = PullerOptions {
        dispatch: DispatchMode::AsynchronousPooled { capacity: 2 },
        thread_name: "built".to_string(),
        ..PullerOptions::default()
    };

    let puller = build_puller::<u32>(&options).unwrap();
    assert_eq!(puller.state(), PullerState::Configured);
}

#[test]
fn test_build_puller_rejects_invalid_options() {
    let options = PullerOptions {
        dispatch: DispatchMode::AsynchronousPooled { capacity: 0 },
        ..PullerOptions::default()
    };

    let result = build_puller::<u32>(&options);
    assert!(matches!(result, Err(PullerError::InvalidConfig(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_built_puller_uses_configured_pool() {
    let options = PullerOptions {
        dispatch: DispatchMode::AsynchronousPooled { capacity: 3 },
        ..PullerOptions::default()
    };
    let (_tx, rx) = tokio::sync::mpsc::channel::<u32>(1);

    let puller = build_puller(&options)
        .unwrap()
        .with_notify_source(rx)
        .with_handler(|_| {});
    puller.start_pull(&CancellationToken::new()).unwrap();

    assert_eq!(puller.pool_stats().map(|stats| stats.worker_count), Some(3));
    puller.stop_pull(Some(Duration::from_secs(1))).await.unwrap();
}
