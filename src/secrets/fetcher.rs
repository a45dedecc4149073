//! Single secret fetch
//!
//! Issues exactly one backend call per resource name and checks that the
//! served version is concrete. Retries belong to the backend client.

use super::backend::SecretVersionAccessor;
use super::error::ResolveError;
use crate::domain::{SecretVersion, SecretVersionName};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// A fetched secret version
pub struct FetchedSecret {
    /// Full resource name of the concrete version that was served
    pub version: String,
    pub data: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for FetchedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedSecret")
            .field("version", &self.version)
            .field("data", &"[REDACTED]")
            .finish()
    }
}

/// Fetch `name` from `client`
///
/// Backend errors are returned unchanged. A response whose version is still an
/// alias (or does not parse) is rejected.
pub async fn fetch_secret(
    client: &dyn SecretVersionAccessor,
    name: &SecretVersionName,
) -> Result<FetchedSecret, ResolveError> {
    let resource_name = name.to_string();

    debug!(
        resource_name = %resource_name,
        endpoint = %client.endpoint(),
        "Accessing secret version"
    );

    let accessed = client.access_secret_version(&resource_name).await?;

    let served = match SecretVersionName::parse(&accessed.name) {
        Ok(served) if !served.version.is_alias() => served,
        _ => {
            warn!(
                resource_name = %resource_name,
                served = %accessed.name,
                "Backend did not report a concrete secret version"
            );
            return Err(ResolveError::UnresolvedVersion { name: accessed.name });
        }
    };

    // pinned requests are expected back at the same version
    if let SecretVersion::Number(requested) = name.version {
        if served.version != SecretVersion::Number(requested) {
            warn!(
                resource_name = %resource_name,
                served = %accessed.name,
                "Backend served a different version than requested"
            );
        }
    }

    Ok(FetchedSecret { version: accessed.name, data: accessed.data })
}
