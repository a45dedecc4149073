//! # gcp-secrets-csi-provider
//!
//! Mount resolution core of a Secrets Store CSI provider backed by Google
//! Secret Manager. A mount request lists secret version resource names; the
//! provider fetches each one from the global or regional Secret Manager
//! endpoint, applies the declared content transformation, and returns the
//! files to write together with the concrete versions that were served.
//!
//! ## Architecture
//!
//! ```text
//! MountParams → MountConfig → MountResolver → ClientSet → SecretVersionAccessor
//!   (config)      (domain)      (services)     (secrets)     (memory / gcp)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gcp_secrets_csi_provider::{
//!     config::MountParams, secrets::{ClientSet, InMemorySecretBackend},
//!     services::MountResolver,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(params: MountParams) -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemorySecretBackend::new("global");
//! backend.add_version("projects/p/secrets/db", "hunter2");
//!
//! let resolver = MountResolver::new(ClientSet::new(Arc::new(backend)));
//! let mount = params.parse()?;
//! let response = resolver.handle_mount_event(&mount, &CancellationToken::new()).await?;
//! for file in &response.files {
//!     println!("{} ({:o})", file.path, file.mode);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod services;

// Re-export commonly used types and traits
pub use config::{MountParams, ProviderConfig};
pub use errors::{ProviderError, Result};
pub use observability::init_observability;
pub use secrets::{ClientSet, MountError, SecretVersionAccessor};
pub use services::MountResolver;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
