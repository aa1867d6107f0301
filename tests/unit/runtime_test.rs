//! Tests for dedicated runtime threads

use channel_puller::runtime::spawn_dedicated;
use std::time::Duration;

#[test]
fn test_spawn_dedicated_drives_timers() {
    let (tx, rx) = std::sync::mpsc::channel();
    let handle = spawn_dedicated("runtime-test".to_string(), 512 * 1024, move || async move {
        let mut interval = tokio::time::interval(Duration::from_millis(5));
        for _ in 0..3 {
            interval.tick().await;
        }
        tx.send(123).unwrap();
    })
    .unwrap();

    handle.join().unwrap();
    assert_eq!(rx.recv().unwrap(), 123);
}

#[test]
fn test_spawn_dedicated_observes_cancellation() {
    let cancel = tokio_util::sync::CancellationToken::new();
    let child = cancel.child_token();
    let handle = spawn_dedicated("runtime-cancel".to_string(), 512 * 1024, move || async move {
        child.cancelled().await;
    })
    .unwrap();

    cancel.cancel();
    handle.join().unwrap();
}
