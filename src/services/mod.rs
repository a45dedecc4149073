//! Business logic services
//!
//! Request-level orchestration on top of the secrets layer.

pub mod mount_resolver;

pub use mount_resolver::{MountResolver, DEFAULT_MAX_CONCURRENT_FETCHES};
