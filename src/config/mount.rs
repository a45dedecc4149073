//! # Mount Attributes
//!
//! Parses the attributes the CSI driver forwards with each mount request into a
//! validated [`MountConfig`]. The attribute map is a JSON object of strings;
//! its `secrets` value is a YAML list of secret entries:
//!
//! ```yaml
//! - resourceName: "projects/p/secrets/db/versions/latest"
//!   fileName: "db-password"
//!   mode: 384
//! - resourceName: "projects/p/locations/us-central1/secrets/cfg/versions/3"
//!   path: "config/app.json"
//!   encoding: "base64"
//! ```

use crate::domain::{MountConfig, PodInfo, SecretConfig};
use crate::errors::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SECRETS_ATTRIBUTE: &str = "secrets";
pub const POD_NAMESPACE_ATTRIBUTE: &str = "csi.storage.k8s.io/pod.namespace";
pub const POD_NAME_ATTRIBUTE: &str = "csi.storage.k8s.io/pod.name";
pub const POD_UID_ATTRIBUTE: &str = "csi.storage.k8s.io/pod.uid";
pub const POD_SERVICE_ACCOUNT_ATTRIBUTE: &str = "csi.storage.k8s.io/serviceAccount.name";

/// Raw mount request as delivered by the driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountParams {
    /// JSON object of string attributes
    pub attributes: String,
    /// Directory the files will be written under
    pub target_path: String,
    /// JSON encoded default file mode
    pub permissions: String,
}

impl MountParams {
    /// Parse and validate into a [`MountConfig`]
    pub fn parse(&self) -> Result<MountConfig> {
        let attributes: HashMap<String, String> = serde_json::from_str(&self.attributes)
            .map_err(|e| {
                ProviderError::config_with_source("Failed to parse mount attributes", Box::new(e))
            })?;

        let permissions: i32 = serde_json::from_str(self.permissions.trim()).map_err(|e| {
            ProviderError::config_with_source(
                format!("Failed to parse file permissions \"{}\"", self.permissions),
                Box::new(e),
            )
        })?;

        let raw_secrets = attributes
            .get(SECRETS_ATTRIBUTE)
            .ok_or_else(|| ProviderError::config("Mount attributes are missing \"secrets\""))?;
        let secrets = parse_secrets(raw_secrets)?;

        let attribute = |key: &str| attributes.get(key).cloned().unwrap_or_default();
        let pod_info = PodInfo {
            namespace: attribute(POD_NAMESPACE_ATTRIBUTE),
            name: attribute(POD_NAME_ATTRIBUTE),
            uid: attribute(POD_UID_ATTRIBUTE),
            service_account: attribute(POD_SERVICE_ACCOUNT_ATTRIBUTE),
        };

        Ok(MountConfig { secrets, permissions, pod_info, target_path: self.target_path.clone() })
    }
}

/// Parse the YAML secret list and validate every entry
pub fn parse_secrets(raw: &str) -> Result<Vec<SecretConfig>> {
    let secrets: Vec<SecretConfig> = serde_yaml::from_str(raw).map_err(|e| {
        ProviderError::config_with_source("Failed to parse \"secrets\" attribute", Box::new(e))
    })?;

    if secrets.is_empty() {
        return Err(ProviderError::config("\"secrets\" attribute lists no secrets"));
    }

    for (index, secret) in secrets.iter().enumerate() {
        validate_secret(secret)
            .map_err(|message| ProviderError::config(format!("secrets[{}]: {}", index, message)))?;
    }

    Ok(secrets)
}

fn validate_secret(secret: &SecretConfig) -> std::result::Result<(), String> {
    if secret.resource_name.trim().is_empty() {
        return Err("resourceName is required".to_string());
    }

    match (&secret.file_name, &secret.path) {
        (Some(_), Some(_)) => return Err("only one of fileName and path may be set".to_string()),
        (None, None) => return Err("one of fileName or path is required".to_string()),
        (Some(file_name), None) => {
            if file_name.is_empty() || file_name.contains('/') {
                return Err(format!("fileName \"{}\" must be a plain file name", file_name));
            }
        }
        (None, Some(path)) => {
            if path.is_empty()
                || path.starts_with('/')
                || path.split('/').any(|component| component == "..")
            {
                return Err(format!("path \"{}\" must be relative and stay inside the mount", path));
            }
        }
    }

    if secret.extract_json_key.is_some() && secret.extract_yaml_key.is_some() {
        return Err("only one of extractJSONKey and extractYAMLKey may be set".to_string());
    }

    Ok(())
}
