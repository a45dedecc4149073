//! Secret Manager access for mount resolution.
//!
//! # Architecture
//!
//! Every backend implements [`SecretVersionAccessor`], a single-method
//! capability: access one fully-qualified secret version and return the
//! concrete version that was served plus its payload. The mount pipeline never
//! constructs clients itself; it receives a [`ClientSet`] holding the global
//! handle and one handle per configured location.
//!
//! Per secret the pipeline runs:
//!
//! 1. [`ClientSet::route`] - pick the handle for the identifier's location
//! 2. [`fetch_secret`] - one backend call, `latest` resolved to a number
//! 3. [`transform_payload`] - optional base64 decoding and key extraction
//!
//! # Backends
//!
//! - [`InMemorySecretBackend`]: local runs and tests
//! - `gcp::GcpSecretManagerClient`: Google Secret Manager (feature `gcp`)

pub mod backend;
pub mod error;
pub mod fetcher;
pub mod gcp;
pub mod memory;
pub mod router;
pub mod transform;

pub use backend::{AccessedSecretVersion, BackendError, SecretVersionAccessor, StatusCode};
pub use error::{MountError, ResolveError, RouteError, SecretFailure, TransformError};
pub use fetcher::{fetch_secret, FetchedSecret};
pub use memory::InMemorySecretBackend;
pub use router::ClientSet;
pub use transform::transform_payload;

#[cfg(feature = "gcp")]
pub use gcp::{build_client_set, GcpSecretManagerClient};
