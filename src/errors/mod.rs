//! # Error Handling
//!
//! Crate-level errors for configuration loading, mount attribute parsing and
//! backend bootstrap. Per-secret resolution failures live in
//! [`crate::secrets::error`] because they are aggregated rather than propagated.

pub mod types;

pub use types::{ProviderError, Result};
