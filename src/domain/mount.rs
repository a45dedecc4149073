//! Mount request and response value objects
//!
//! A [`MountConfig`] lists the secrets a workload asked for; a
//! [`MountResponse`] carries one resolved version and one file per requested
//! secret, in request order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared encoding of a secret payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Payload is base64 text to be decoded before writing
    Base64,
}

impl ContentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base64 => "base64",
        }
    }
}

impl FromStr for ContentEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base64" => Ok(Self::Base64),
            _ => Err(format!("Unknown secret encoding: {}", s)),
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional extraction of a single key from a structured payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyExtraction {
    Json(String),
    Yaml(String),
}

/// One requested secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretConfig {
    /// Secret version resource name, kept verbatim for the response
    pub resource_name: String,

    /// Destination file name inside the mount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Relative destination path, may include sub-directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Per-secret file mode, overrides the mount default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<ContentEncoding>,

    #[serde(default, rename = "extractJSONKey", skip_serializing_if = "Option::is_none")]
    pub extract_json_key: Option<String>,

    #[serde(default, rename = "extractYAMLKey", skip_serializing_if = "Option::is_none")]
    pub extract_yaml_key: Option<String>,
}

impl SecretConfig {
    /// Secret written to `file_name` with no overrides
    pub fn new(resource_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            file_name: Some(file_name.into()),
            path: None,
            mode: None,
            encoding: None,
            extract_json_key: None,
            extract_yaml_key: None,
        }
    }

    pub fn with_mode(mut self, mode: i32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.file_name = None;
        self.path = Some(path.into());
        self
    }

    pub fn with_json_key(mut self, key: impl Into<String>) -> Self {
        self.extract_json_key = Some(key.into());
        self
    }

    pub fn with_yaml_key(mut self, key: impl Into<String>) -> Self {
        self.extract_yaml_key = Some(key.into());
        self
    }

    /// Path of the file relative to the mount; `path` wins over `file_name`
    ///
    /// Empty when neither is set.
    pub fn output_path(&self) -> &str {
        self.path.as_deref().or(self.file_name.as_deref()).unwrap_or_default()
    }

    /// Effective mode: the per-secret override if set, else the mount default
    pub fn effective_mode(&self, default_mode: i32) -> i32 {
        self.mode.unwrap_or(default_mode)
    }

    /// Requested key extraction, JSON taking precedence if both are set
    pub fn key_extraction(&self) -> Option<KeyExtraction> {
        match (&self.extract_json_key, &self.extract_yaml_key) {
            (Some(key), _) => Some(KeyExtraction::Json(key.clone())),
            (None, Some(key)) => Some(KeyExtraction::Yaml(key.clone())),
            (None, None) => None,
        }
    }
}

/// Identity of the pod the mount is for; only used for attribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInfo {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub service_account: String,
}

/// A complete mount request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    pub secrets: Vec<SecretConfig>,
    /// Default file mode, passed through verbatim
    pub permissions: i32,
    pub pod_info: PodInfo,
    pub target_path: String,
}

impl MountConfig {
    pub fn new(secrets: Vec<SecretConfig>, permissions: i32, pod_info: PodInfo) -> Self {
        Self { secrets, permissions, pod_info, target_path: String::new() }
    }
}

/// Requested identifier paired with the concrete version that was served
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectVersion {
    pub id: String,
    pub version: String,
}

/// A file to be written by the caller
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountedFile {
    pub path: String,
    pub mode: i32,
    pub contents: Vec<u8>,
}

impl fmt::Debug for MountedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("contents", &format_args!("[{} bytes]", self.contents.len()))
            .finish()
    }
}

/// Result of a successful mount, entries in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountResponse {
    pub object_versions: Vec<ObjectVersion>,
    pub files: Vec<MountedFile>,
}
