//! Builders to construct pullers from configuration.

pub mod puller_builder;

pub use puller_builder::{build_puller, build_puller_from_env};
