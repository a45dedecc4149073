//! Secret version resource names
//!
//! Parses and validates identifiers of the form
//! `projects/<project>/[locations/<location>/]secrets/<name>/versions/<version>`.
//! The location segment selects a regional Secret Manager endpoint; identifiers
//! without one are served by the global endpoint.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Longest location id accepted in a resource name
pub const MAX_LOCATION_LEN: usize = 30;

static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z](?:[a-z0-9-]*[a-z0-9])?$").expect("valid location regex"));

/// Errors produced while parsing a secret resource name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The location segment is split, empty, too long or not a location id
    #[error("Invalid secret resource name \"{resource_name}\": invalid location \"{location}\"")]
    InvalidLocation { resource_name: String, location: String },

    /// Any other structural problem with the resource name
    #[error("Invalid secret resource name \"{resource_name}\": {reason}")]
    InvalidResourceName { resource_name: String, reason: String },
}

impl IdentifierError {
    fn invalid_location(resource_name: &str, location: impl Into<String>) -> Self {
        Self::InvalidLocation {
            resource_name: resource_name.to_string(),
            location: location.into(),
        }
    }

    fn invalid_name(resource_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResourceName {
            resource_name: resource_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true when the failure is confined to the location segment
    pub fn is_invalid_location(&self) -> bool {
        matches!(self, Self::InvalidLocation { .. })
    }
}

/// Version selector of a secret resource name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretVersion {
    /// The `latest` alias, resolved server-side
    Latest,
    /// A concrete version number
    Number(u64),
}

impl SecretVersion {
    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Latest)
    }
}

impl fmt::Display for SecretVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A validated secret version resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretVersionName {
    pub project: String,
    pub location: Option<String>,
    pub secret: String,
    pub version: SecretVersion,
}

impl SecretVersionName {
    /// Parse a resource name, rejecting anything that is not exactly the
    /// global or the regional shape.
    pub fn parse(resource_name: &str) -> Result<Self, IdentifierError> {
        let segments: Vec<&str> = resource_name.split('/').collect();

        // shortest valid name: projects/p/secrets/s/versions/v
        if segments.len() < 6 {
            return Err(IdentifierError::invalid_name(resource_name, "too few path segments"));
        }
        if segments[0] != "projects" {
            return Err(IdentifierError::invalid_name(
                resource_name,
                "must start with \"projects/\"",
            ));
        }

        let tail = segments.len() - 4;
        if segments[tail] != "secrets" || segments[tail + 2] != "versions" {
            return Err(IdentifierError::invalid_name(
                resource_name,
                "must end with \"secrets/<name>/versions/<version>\"",
            ));
        }

        let project = non_empty(resource_name, segments[1], "project")?;
        let secret = non_empty(resource_name, segments[tail + 1], "secret name")?;
        let version = parse_version(resource_name, segments[tail + 3])?;

        let location = match tail {
            2 => None,
            _ if segments[2] == "locations" => {
                let location_segments = &segments[3..tail];
                let location = location_segments.join("/");
                if location_segments.len() != 1 {
                    return Err(IdentifierError::invalid_location(resource_name, location));
                }
                validate_location(resource_name, &location)?;
                Some(location)
            }
            _ => {
                return Err(IdentifierError::invalid_name(
                    resource_name,
                    format!("unexpected segment \"{}\" after project", segments[2]),
                ))
            }
        };

        Ok(Self { project: project.to_string(), location, secret: secret.to_string(), version })
    }

    /// True when the name carries a location segment
    pub fn is_regional(&self) -> bool {
        self.location.is_some()
    }

    /// The same secret at a different version
    pub fn with_version(&self, version: SecretVersion) -> Self {
        Self { version, ..self.clone() }
    }

    /// Resource name of the secret itself, without the version suffix
    pub fn secret_path(&self) -> String {
        match &self.location {
            Some(location) => {
                format!("projects/{}/locations/{}/secrets/{}", self.project, location, self.secret)
            }
            None => format!("projects/{}/secrets/{}", self.project, self.secret),
        }
    }
}

impl fmt::Display for SecretVersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/versions/{}", self.secret_path(), self.version)
    }
}

impl FromStr for SecretVersionName {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn non_empty<'a>(
    resource_name: &str,
    segment: &'a str,
    what: &str,
) -> Result<&'a str, IdentifierError> {
    if segment.is_empty() {
        Err(IdentifierError::invalid_name(resource_name, format!("empty {}", what)))
    } else {
        Ok(segment)
    }
}

fn parse_version(resource_name: &str, token: &str) -> Result<SecretVersion, IdentifierError> {
    if token == "latest" {
        return Ok(SecretVersion::Latest);
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentifierError::invalid_name(
            resource_name,
            format!("version \"{}\" must be a number or \"latest\"", token),
        ));
    }
    // the rendered name must match the requested one byte for byte
    if token.len() > 1 && token.starts_with('0') {
        return Err(IdentifierError::invalid_name(
            resource_name,
            format!("version \"{}\" must not have leading zeros", token),
        ));
    }
    match token.parse::<u64>() {
        Ok(0) | Err(_) => Err(IdentifierError::invalid_name(
            resource_name,
            format!("version \"{}\" is out of range", token),
        )),
        Ok(n) => Ok(SecretVersion::Number(n)),
    }
}

/// True when `location` is a well-formed location id such as `us-central1`
pub fn is_valid_location(location: &str) -> bool {
    location.len() <= MAX_LOCATION_LEN && LOCATION_RE.is_match(location)
}

fn validate_location(resource_name: &str, location: &str) -> Result<(), IdentifierError> {
    if !is_valid_location(location) {
        return Err(IdentifierError::invalid_location(resource_name, location));
    }
    Ok(())
}
