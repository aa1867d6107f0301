//! Runtime adapters for puller-owned background activity.

pub mod dedicated;

pub use dedicated::spawn_dedicated;
