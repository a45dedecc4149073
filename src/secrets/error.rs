//! Error types for mount resolution.
//!
//! Per-secret failures are collected into a [`MountError`] instead of being
//! returned one at a time, so a single failed mount reports every cause.

use super::backend::{BackendError, StatusCode};
use crate::domain::IdentifierError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Routing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The identifier names a location with no regional handle
    #[error("no Secret Manager client configured for location \"{location}\"")]
    UnconfiguredLocation { location: String },
}

/// Content transformation failures
#[derive(Error, Debug)]
pub enum TransformError {
    /// Declared base64 encoding does not match the payload
    #[error("failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload is not a JSON object or does not parse
    #[error("failed to parse payload as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is not a YAML mapping or does not parse
    #[error("failed to parse payload as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The requested key is absent
    #[error("key \"{key}\" not found in {format} payload")]
    MissingKey { key: String, format: &'static str },

    /// The key holds a nested structure rather than a scalar
    #[error("key \"{key}\" in {format} payload is not a scalar value")]
    NotScalar { key: String, format: &'static str },
}

/// Why a single secret could not be resolved
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Neither a file name nor a path was given
    #[error("no destination file name or path")]
    MissingDestination,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("failed to access secret version: {0}")]
    Backend(#[from] BackendError),

    /// The backend answered without naming a concrete version
    #[error("backend returned unresolved version \"{name}\"")]
    UnresolvedVersion { name: String },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("fetch cancelled before completion")]
    Cancelled,

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl ResolveError {
    /// Backend status code, if the failure came from the backend
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Backend(e) => Some(e.code),
            _ => None,
        }
    }

    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Identifier(e) if e.is_invalid_location() => "invalid_location",
            Self::Identifier(_) => "invalid_resource_name",
            Self::MissingDestination => "missing_destination",
            Self::Route(_) => "unconfigured_location",
            Self::Backend(_) => "backend",
            Self::UnresolvedVersion { .. } => "unresolved_version",
            Self::Transform(_) => "transform",
            Self::Cancelled => "cancelled",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// One failed secret of a mount request
#[derive(Debug)]
pub struct SecretFailure {
    /// Position of the secret in the request
    pub index: usize,
    pub resource_name: String,
    pub cause: ResolveError,
}

impl fmt::Display for SecretFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "secrets[{}] \"{}\": {}", self.index, self.resource_name, self.cause)
    }
}

/// Aggregated failure of a mount request
///
/// Holds every per-secret failure in request order. Never empty when
/// constructed through [`MountError::from_failures`].
#[derive(Debug)]
pub struct MountError {
    failures: Vec<SecretFailure>,
    total: usize,
}

impl MountError {
    /// Returns `None` when there is nothing to report
    pub fn from_failures(mut failures: Vec<SecretFailure>, total: usize) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        failures.sort_by_key(|f| f.index);
        Some(Self { failures, total })
    }

    pub fn failures(&self) -> &[SecretFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<SecretFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of secrets in the failed request
    pub fn total(&self) -> usize {
        self.total
    }
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to resolve {} of {} secrets: ", self.failures.len(), self.total)?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for MountError {}
