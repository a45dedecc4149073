//! # Configuration Management
//!
//! Provider settings come from the environment ([`ProviderConfig::from_env`]);
//! per-mount configuration comes from the attributes the driver sends with
//! each request ([`MountParams::parse`]).

pub mod mount;
pub mod settings;

pub use mount::{parse_secrets, MountParams};
pub use settings::{parse_regions, FetchConfig, ObservabilityConfig, ProviderConfig};
