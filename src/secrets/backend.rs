//! Secret version accessor trait and types
//!
//! Defines the single capability the mount pipeline needs from Secret Manager:
//! read one secret version by its full resource name.

use async_trait::async_trait;
use std::fmt;
use zeroize::Zeroizing;

/// Canonical status codes reported by Secret Manager
///
/// Rendered with the same names the gRPC status codes use so that operators
/// can grep aggregated errors for e.g. `PermissionDenied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "Canceled",
            Self::Unknown => "Unknown",
            Self::InvalidArgument => "InvalidArgument",
            Self::DeadlineExceeded => "DeadlineExceeded",
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::PermissionDenied => "PermissionDenied",
            Self::ResourceExhausted => "ResourceExhausted",
            Self::FailedPrecondition => "FailedPrecondition",
            Self::Aborted => "Aborted",
            Self::OutOfRange => "OutOfRange",
            Self::Unimplemented => "Unimplemented",
            Self::Internal => "Internal",
            Self::Unavailable => "Unavailable",
            Self::DataLoss => "DataLoss",
            Self::Unauthenticated => "Unauthenticated",
        }
    }

    /// Map the `status` string of a Google API error body (`PERMISSION_DENIED`)
    pub fn from_google_status(status: &str) -> Self {
        match status {
            "CANCELLED" => Self::Cancelled,
            "INVALID_ARGUMENT" => Self::InvalidArgument,
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded,
            "NOT_FOUND" => Self::NotFound,
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted,
            "FAILED_PRECONDITION" => Self::FailedPrecondition,
            "ABORTED" => Self::Aborted,
            "OUT_OF_RANGE" => Self::OutOfRange,
            "UNIMPLEMENTED" => Self::Unimplemented,
            "INTERNAL" => Self::Internal,
            "UNAVAILABLE" => Self::Unavailable,
            "DATA_LOSS" => Self::DataLoss,
            "UNAUTHENTICATED" => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }

    /// Fallback mapping from an HTTP status when the body carries no status
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidArgument,
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::Aborted,
            412 => Self::FailedPrecondition,
            429 => Self::ResourceExhausted,
            499 => Self::Cancelled,
            501 => Self::Unimplemented,
            503 => Self::Unavailable,
            504 => Self::DeadlineExceeded,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a backend, kept verbatim for aggregation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("code = {code} desc = {message}")]
pub struct BackendError {
    pub code: StatusCode,
    pub message: String,
}

impl BackendError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Payload of one secret version as returned by the backend
///
/// `name` is the full resource name of the version that was served, which for
/// a `latest` request carries the concrete version number.
pub struct AccessedSecretVersion {
    pub name: String,
    pub data: Zeroizing<Vec<u8>>,
}

impl AccessedSecretVersion {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), data: Zeroizing::new(data.into()) }
    }
}

impl fmt::Debug for AccessedSecretVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessedSecretVersion")
            .field("name", &self.name)
            .field("data", &"[REDACTED]")
            .finish()
    }
}

/// A handle onto one Secret Manager endpoint
///
/// Implementations must be Send + Sync; the same handle serves every
/// concurrent fetch of a mount request.
#[async_trait]
pub trait SecretVersionAccessor: Send + Sync + fmt::Debug {
    /// Read one secret version by its full resource name
    async fn access_secret_version(
        &self,
        name: &str,
    ) -> Result<AccessedSecretVersion, BackendError>;

    /// Short label used in logs (`global`, `us-central1`, `memory`)
    fn endpoint(&self) -> &str;
}
