//! In-memory Secret Manager backend
//!
//! Holds secret versions in process memory. Used for local runs without GCP
//! access and as the test double for the mount pipeline. `latest` resolves to
//! the highest version, mirroring Secret Manager.

use super::backend::{AccessedSecretVersion, BackendError, SecretVersionAccessor, StatusCode};
use crate::domain::{SecretVersion, SecretVersionName};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

/// In-memory secret backend
#[derive(Clone)]
pub struct InMemorySecretBackend {
    endpoint: String,
    // secret path -> versions, version n at index n - 1
    versions: Arc<DashMap<String, Vec<Zeroizing<Vec<u8>>>>>,
    // full version name -> error returned instead of data
    failures: Arc<DashMap<String, BackendError>>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl std::fmt::Debug for InMemorySecretBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySecretBackend")
            .field("endpoint", &self.endpoint)
            .field("secrets", &self.versions.len())
            .field("failures", &self.failures.len())
            .finish()
    }
}

impl InMemorySecretBackend {
    /// Create an empty backend labelled `endpoint` in logs
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            versions: Arc::new(DashMap::new()),
            failures: Arc::new(DashMap::new()),
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay every access by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Append a new version to `secret_path` and return its number
    pub fn add_version(&self, secret_path: &str, data: impl Into<Vec<u8>>) -> u64 {
        let mut entry = self.versions.entry(secret_path.to_string()).or_default();
        entry.push(Zeroizing::new(data.into()));
        entry.len() as u64
    }

    /// Make every access of the exact `version_name` fail with `error`
    pub fn fail_with(&self, version_name: &str, error: BackendError) {
        self.failures.insert(version_name.to_string(), error);
    }

    /// Number of access calls served so far
    pub fn access_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretVersionAccessor for InMemorySecretBackend {
    async fn access_secret_version(
        &self,
        name: &str,
    ) -> Result<AccessedSecretVersion, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.failures.get(name) {
            debug!(name = %name, code = %error.code, "Returning programmed failure");
            return Err(error.value().clone());
        }

        let parsed = SecretVersionName::parse(name)
            .map_err(|e| BackendError::new(StatusCode::InvalidArgument, e.to_string()))?;
        let secret_path = parsed.secret_path();

        let versions = self.versions.get(&secret_path).ok_or_else(|| {
            BackendError::new(
                StatusCode::NotFound,
                format!("Secret [{}] not found or has no versions.", secret_path),
            )
        })?;

        let number = match parsed.version {
            SecretVersion::Latest => versions.value().len() as u64,
            SecretVersion::Number(n) => n,
        };
        let data = usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| versions.value().get(i))
            .ok_or_else(|| {
                BackendError::new(
                    StatusCode::NotFound,
                    format!("Secret Version [{}] not found.", name),
                )
            })?;

        let served = parsed.with_version(SecretVersion::Number(number));
        Ok(AccessedSecretVersion { name: served.to_string(), data: data.clone() })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
