//! GCP Secret Manager backend implementation
//!
//! Accesses secret versions through the Secret Manager REST API. One
//! [`GcpSecretManagerClient`] targets one endpoint:
//!
//! - global: `https://secretmanager.googleapis.com/`
//! - regional: `https://secretmanager.<location>.rep.googleapis.com/`
//!
//! Regional secrets (`projects/*/locations/*/secrets/*`) can only be read
//! through the endpoint of their location, which is why the mount pipeline
//! routes by location before fetching.
//!
//! ## Errors
//!
//! Google API error bodies look like
//!
//! ```json
//! {
//!   "error": {
//!     "code": 403,
//!     "message": "Permission denied on resource",
//!     "status": "PERMISSION_DENIED"
//!   }
//! }
//! ```
//!
//! and are mapped onto [`StatusCode`] with the message kept verbatim.

use super::backend::{BackendError, StatusCode};

#[cfg(feature = "gcp")]
use super::backend::{AccessedSecretVersion, SecretVersionAccessor};
#[cfg(feature = "gcp")]
use super::router::ClientSet;
#[cfg(feature = "gcp")]
use crate::errors::{ProviderError, Result};
#[cfg(feature = "gcp")]
use async_trait::async_trait;
#[cfg(feature = "gcp")]
use std::sync::Arc;
#[cfg(feature = "gcp")]
use tracing::{debug, error, info};
#[cfg(feature = "gcp")]
use zeroize::Zeroizing;

#[cfg(feature = "gcp")]
use google_secretmanager1::{common::GetToken, hyper_rustls, hyper_util, SecretManager};

/// Global Secret Manager endpoint
pub const GLOBAL_ENDPOINT: &str = "https://secretmanager.googleapis.com/";

/// Endpoint serving secrets stored in `location`
pub fn regional_endpoint(location: &str) -> String {
    format!("https://secretmanager.{}.rep.googleapis.com/", location)
}

/// Convert a Google API error body into a [`BackendError`]
///
/// Falls back to the HTTP `code` when `status` is absent and to `Unknown`
/// when the body is not a Google error at all.
pub fn backend_error_from_body(body: &serde_json::Value) -> BackendError {
    let Some(error) = body.get("error") else {
        return BackendError::new(StatusCode::Unknown, body.to_string());
    };

    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| error.to_string());

    let code = match error.get("status").and_then(|s| s.as_str()) {
        Some(status) => StatusCode::from_google_status(status),
        None => error
            .get("code")
            .and_then(|c| c.as_u64())
            .and_then(|c| u16::try_from(c).ok())
            .map(StatusCode::from_http_status)
            .unwrap_or(StatusCode::Unknown),
    };

    BackendError::new(code, message)
}

#[cfg(feature = "gcp")]
type Connector = hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;

/// Secret Manager client bound to one endpoint
#[cfg(feature = "gcp")]
pub struct GcpSecretManagerClient {
    hub: SecretManager<Connector>,
    endpoint: String,
    label: String,
}

#[cfg(feature = "gcp")]
impl std::fmt::Debug for GcpSecretManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretManagerClient")
            .field("endpoint", &self.endpoint)
            .field("label", &self.label)
            .field("hub", &"[SecretManager]")
            .finish()
    }
}

#[cfg(feature = "gcp")]
impl GcpSecretManagerClient {
    /// Client for the global endpoint
    pub fn global<A>(auth: A) -> Result<Self>
    where
        A: GetToken + 'static,
    {
        Self::with_endpoint(auth, GLOBAL_ENDPOINT, "global")
    }

    /// Client for the regional endpoint of `location`
    pub fn regional<A>(auth: A, location: &str) -> Result<Self>
    where
        A: GetToken + 'static,
    {
        Self::with_endpoint(auth, &regional_endpoint(location), location)
    }

    /// Client for an arbitrary endpoint, e.g. a private service connect address
    pub fn with_endpoint<A>(auth: A, endpoint: &str, label: &str) -> Result<Self>
    where
        A: GetToken + 'static,
    {
        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(
                    hyper_rustls::HttpsConnectorBuilder::new()
                        .with_native_roots()
                        .map_err(|e| {
                            ProviderError::config(format!(
                                "Failed to load native TLS roots: {}",
                                e
                            ))
                        })?
                        .https_or_http()
                        .enable_http2()
                        .build(),
                );

        let mut hub = SecretManager::new(client, auth);
        let endpoint = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{}/", endpoint)
        };
        hub.base_url(endpoint.clone());
        hub.root_url(endpoint.clone());

        info!(endpoint = %endpoint, label = %label, "Initialized Secret Manager client");

        Ok(Self { hub, endpoint, label: label.to_string() })
    }
}

#[cfg(feature = "gcp")]
#[async_trait]
impl SecretVersionAccessor for GcpSecretManagerClient {
    async fn access_secret_version(
        &self,
        name: &str,
    ) -> std::result::Result<AccessedSecretVersion, BackendError> {
        debug!(name = %name, endpoint = %self.endpoint, "Accessing secret version");

        let result = if name.contains("/locations/") {
            self.hub.projects().locations_secrets_versions_access(name).doit().await
        } else {
            self.hub.projects().secrets_versions_access(name).doit().await
        };

        match result {
            Ok((_, response)) => {
                let served = response.name.ok_or_else(|| {
                    BackendError::new(
                        StatusCode::Internal,
                        format!("response for {} carries no version name", name),
                    )
                })?;
                let data = response.payload.and_then(|p| p.data).unwrap_or_default();
                Ok(AccessedSecretVersion { name: served, data: Zeroizing::new(data) })
            }
            Err(google_secretmanager1::Error::BadRequest(body)) => {
                let err = backend_error_from_body(&body);
                error!(
                    name = %name,
                    code = %err.code,
                    error = %err.message,
                    "Secret Manager rejected request"
                );
                Err(err)
            }
            Err(google_secretmanager1::Error::Failure(response)) => {
                let code = StatusCode::from_http_status(response.status().as_u16());
                error!(name = %name, code = %code, "Secret Manager request failed");
                Err(BackendError::new(code, format!("HTTP {}", response.status())))
            }
            Err(e) => {
                error!(name = %name, error = %e, "Secret Manager request failed");
                Err(BackendError::new(StatusCode::Unavailable, e.to_string()))
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.label
    }
}

/// Build the global client plus one regional client per location
#[cfg(feature = "gcp")]
pub fn build_client_set<A>(auth: A, locations: &[String]) -> Result<ClientSet>
where
    A: GetToken + Clone + 'static,
{
    let mut clients = ClientSet::new(Arc::new(GcpSecretManagerClient::global(auth.clone())?));
    for location in locations {
        let client = GcpSecretManagerClient::regional(auth.clone(), location)?;
        clients.register_location(location.clone(), Arc::new(client));
    }
    Ok(clients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_regional_endpoint() {
        assert_eq!(
            regional_endpoint("us-central1"),
            "https://secretmanager.us-central1.rep.googleapis.com/"
        );
    }

    #[test]
    fn test_error_body_with_status() {
        let body = json!({
            "error": {"code": 400, "message": "Secret is Disabled", "status": "FAILED_PRECONDITION"}
        });
        let err = backend_error_from_body(&body);
        assert_eq!(err.code, StatusCode::FailedPrecondition);
        assert_eq!(err.message, "Secret is Disabled");
    }

    #[test]
    fn test_error_body_without_status_uses_http_code() {
        let body = json!({"error": {"code": 403, "message": "denied"}});
        assert_eq!(backend_error_from_body(&body).code, StatusCode::PermissionDenied);
    }

    #[test]
    fn test_non_google_body_is_unknown() {
        let body = json!({"unexpected": true});
        let err = backend_error_from_body(&body);
        assert_eq!(err.code, StatusCode::Unknown);
        assert!(err.message.contains("unexpected"));
    }
}
