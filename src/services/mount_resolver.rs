//! Mount event resolution
//!
//! Resolves every secret of a [`MountConfig`] into one [`ObjectVersion`] and one
//! [`MountedFile`]:
//!
//! ```text
//! resourceName -> parse -> route -> fetch -> transform -> (version, file)
//! ```
//!
//! Fetches run concurrently up to a configured bound, but outcomes are
//! collected in request order and every secret is attempted. A mount succeeds
//! only when all secrets resolve; otherwise the caller gets one [`MountError`]
//! listing every failure.

use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::FetchConfig;
use crate::domain::{
    MountConfig, MountResponse, MountedFile, ObjectVersion, SecretConfig, SecretVersionName,
};
use crate::secrets::{
    fetch_secret, transform_payload, ClientSet, FetchedSecret, MountError, ResolveError,
    SecretFailure, SecretVersionAccessor,
};

/// Default bound on concurrent backend calls per mount
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Resolves mount requests against a fixed set of Secret Manager handles
#[derive(Debug, Clone)]
pub struct MountResolver {
    clients: ClientSet,
    max_concurrent_fetches: usize,
    fetch_timeout: Option<Duration>,
}

impl MountResolver {
    /// Create a resolver with default limits
    pub fn new(clients: ClientSet) -> Self {
        Self {
            clients,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            fetch_timeout: None,
        }
    }

    /// Create a resolver with limits taken from `config`
    pub fn from_config(clients: ClientSet, config: &FetchConfig) -> Self {
        Self::new(clients)
            .with_max_concurrent_fetches(config.max_concurrent_fetches)
            .with_fetch_timeout(config.fetch_timeout())
    }

    /// Bound the number of in-flight fetches; values below 1 mean 1
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    /// Fail any single fetch that takes longer than `timeout`
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn clients(&self) -> &ClientSet {
        &self.clients
    }

    /// Resolve every secret of `config`
    ///
    /// Cancelling `cancel` aborts fetches still in flight; those secrets fail
    /// with [`ResolveError::Cancelled`] and the mount fails as a whole.
    pub async fn handle_mount_event(
        &self,
        config: &MountConfig,
        cancel: &CancellationToken,
    ) -> Result<MountResponse, MountError> {
        let span = crate::mount_span!(config.pod_info, secrets = config.secrets.len());
        self.resolve_all(config, cancel).instrument(span).await
    }

    async fn resolve_all(
        &self,
        config: &MountConfig,
        cancel: &CancellationToken,
    ) -> Result<MountResponse, MountError> {
        let total = config.secrets.len();
        info!(target_path = %config.target_path, "Resolving mount");

        // buffered keeps request order regardless of completion order
        let outcomes: Vec<Result<(ObjectVersion, MountedFile), ResolveError>> =
            stream::iter(
                config
                    .secrets
                    .iter()
                    .map(|secret| self.resolve_secret(secret, config.permissions, cancel)),
            )
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        let mut response = MountResponse::default();
        let mut failures = Vec::new();

        for (index, (secret, outcome)) in config.secrets.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok((version, file)) => {
                    response.object_versions.push(version);
                    response.files.push(file);
                }
                Err(cause) => {
                    warn!(
                        index = index,
                        resource_name = %secret.resource_name,
                        kind = cause.kind(),
                        error = %cause,
                        "Failed to resolve secret"
                    );
                    failures.push(SecretFailure {
                        index,
                        resource_name: secret.resource_name.clone(),
                        cause,
                    });
                }
            }
        }

        if let Some(err) = MountError::from_failures(failures, total) {
            error!(failed = err.len(), total = total, "Mount failed");
            return Err(err);
        }

        info!(total = total, "Mount resolved");
        Ok(response)
    }

    async fn resolve_secret(
        &self,
        secret: &SecretConfig,
        default_mode: i32,
        cancel: &CancellationToken,
    ) -> Result<(ObjectVersion, MountedFile), ResolveError> {
        if secret.output_path().is_empty() {
            return Err(ResolveError::MissingDestination);
        }
        let name = SecretVersionName::parse(&secret.resource_name)?;
        let client = self.clients.route(&name)?;

        let fetched = self.fetch_until_cancelled(client.as_ref(), &name, cancel).await?;
        let contents =
            transform_payload(fetched.data, secret.encoding, secret.key_extraction().as_ref())?;

        debug!(
            resource_name = %secret.resource_name,
            version = %fetched.version,
            path = %secret.output_path(),
            bytes = contents.len(),
            "Resolved secret"
        );

        Ok((
            ObjectVersion { id: secret.resource_name.clone(), version: fetched.version },
            MountedFile {
                path: secret.output_path().to_string(),
                mode: secret.effective_mode(default_mode),
                contents,
            },
        ))
    }

    async fn fetch_until_cancelled(
        &self,
        client: &dyn SecretVersionAccessor,
        name: &SecretVersionName,
        cancel: &CancellationToken,
    ) -> Result<FetchedSecret, ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let bounded = async {
            match self.fetch_timeout {
                Some(limit) => tokio::time::timeout(limit, fetch_secret(client, name))
                    .await
                    .unwrap_or_else(|_| Err(ResolveError::Timeout(limit))),
                None => fetch_secret(client, name).await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResolveError::Cancelled),
            result = bounded => result,
        }
    }
}
