//! Tests for configuration parsing and validation

use channel_puller::config::{
    DispatchMode, PullerOptions, WorkerPoolConfig, DEFAULT_THREAD_NAME, DEFAULT_THREAD_STACK_SIZE,
};

#[test]
fn test_puller_options_defaults() {
    let options = PullerOptions::default();
    assert_eq!(options.dispatch, DispatchMode::Synchronous);
    assert_eq!(options.thread_name, DEFAULT_THREAD_NAME);
    assert_eq!(options.thread_stack_size, DEFAULT_THREAD_STACK_SIZE);
}

#[test]
fn test_puller_options_from_json_pooled() {
    let options = PullerOptions::from_json_str(
        r#"{"dispatch": {"mode": "asynchronous_pooled", "capacity": 4}, "thread_name": "orders"}"#,
    )
    .unwrap();

    assert_eq!(options.dispatch, DispatchMode::AsynchronousPooled { capacity: 4 });
    assert_eq!(options.thread_name, "orders");
    // Missing fields keep their defaults.
    assert_eq!(options.thread_stack_size, DEFAULT_THREAD_STACK_SIZE);
}

#[test]
fn test_puller_options_from_json_unbounded() {
    let options =
        PullerOptions::from_json_str(r#"{"dispatch": {"mode": "asynchronous_unbounded"}}"#)
            .unwrap();
    assert_eq!(options.dispatch, DispatchMode::AsynchronousUnbounded);
    assert!(options.dispatch.is_async());
}

#[test]
fn test_puller_options_from_json_rejects_zero_capacity() {
    let err = PullerOptions::from_json_str(
        r#"{"dispatch": {"mode": "asynchronous_pooled", "capacity": 0}}"#,
    )
    .unwrap_err();
    assert!(err.contains("capacity"));
}

#[test]
fn test_puller_options_from_json_parse_error() {
    let err = PullerOptions::from_json_str("{not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_puller_options_invalid_fields() {
    let mut options = PullerOptions::default();
    options.thread_name.clear();
    assert!(options.validate().is_err());

    let options = PullerOptions {
        thread_stack_size: 0,
        ..PullerOptions::default()
    };
    assert!(options.validate().is_err());
}

#[test]
fn test_dispatch_mode_serialization() {
    let json = serde_json::to_value(DispatchMode::AsynchronousPooled { capacity: 2 }).unwrap();
    assert_eq!(json, serde_json::json!({"mode": "asynchronous_pooled", "capacity": 2}));

    let json = serde_json::to_value(DispatchMode::Synchronous).unwrap();
    assert_eq!(json, serde_json::json!({"mode": "synchronous"}));
}

#[test]
fn test_dispatch_mode_labels() {
    assert_eq!(DispatchMode::Synchronous.label(), "sync");
    assert_eq!(DispatchMode::AsynchronousUnbounded.label(), "async");
    assert_eq!(
        DispatchMode::AsynchronousPooled { capacity: 1 }.label(),
        "async_bounded"
    );
    assert!(!DispatchMode::Synchronous.is_async());
}

#[test]
fn test_worker_pool_config_validation() {
    assert!(WorkerPoolConfig::new().validate().is_ok());
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new()
        .with_thread_stack_size(0)
        .validate()
        .is_err());
}
