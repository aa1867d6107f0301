//! Tests for error types

use channel_puller::core::{PoolError, PullerError};
use std::time::Duration;

#[test]
fn test_stop_timeout_error() {
    let err = PullerError::StopTimeout {
        timeout: Duration::from_millis(250),
    };
    assert_eq!(format!("{}", err), "stop timed out after 250ms");
}

#[test]
fn test_invalid_config_error() {
    let err = PullerError::InvalidConfig("thread_name must not be empty".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: thread_name must not be empty"
    );
}

#[test]
fn test_spawn_error() {
    let err = PullerError::Spawn("pulling loop thread: out of memory".to_string());
    assert_eq!(format!("{}", err), "spawn failed: pulling loop thread: out of memory");
}

#[test]
fn test_pool_error_converts_into_puller_error() {
    let err: PullerError = PoolError::PoolShutdown.into();
    assert!(matches!(err, PullerError::Pool(PoolError::PoolShutdown)));
    assert_eq!(format!("{}", err), "worker pool error: pool has been shut down");
}

#[test]
fn test_pool_error_display() {
    assert_eq!(
        format!("{}", PoolError::InvalidConfig("worker_count must be greater than 0".into())),
        "invalid configuration: worker_count must be greater than 0"
    );
    assert_eq!(
        format!("{}", PoolError::Internal("failed to spawn worker 0".into())),
        "internal error: failed to spawn worker 0"
    );
}

#[test]
fn test_errors_flow_into_app_result() {
    fn spawn() -> Result<(), PullerError> {
        Err(PullerError::Spawn("boom".to_string()))
    }

    fn fallible() -> channel_puller::core::AppResult<()> {
        spawn()?;
        Ok(())
    }

    let err = fallible().unwrap_err();
    assert!(err.downcast_ref::<PullerError>().is_some());
}
