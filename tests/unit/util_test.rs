//! Tests for utility functions

use channel_puller::util::{init_test_tracing, init_tracing};

#[test]
fn test_init_tracing_is_idempotent() {
    init_test_tracing();
    init_tracing();
    init_test_tracing();
    assert!(tracing::dispatcher::has_been_set());
}
