//! # Configuration Settings
//!
//! Provider configuration loaded from `GCP_PROVIDER_*` environment variables.

use crate::domain::is_valid_location;
use crate::errors::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct ProviderConfig {
    /// Secret fetch configuration
    #[validate(nested)]
    pub fetch: FetchConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl ProviderConfig {
    /// Load every section from the environment and validate the result
    pub fn from_env() -> Result<Self> {
        let config = Self {
            fetch: FetchConfig::from_env()?,
            observability: ObservabilityConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(ProviderError::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        for region in &self.fetch.regions {
            if !is_valid_location(region) {
                return Err(ProviderError::validation_field(
                    format!("Invalid region \"{}\"", region),
                    "regions",
                ));
            }
        }
        Ok(())
    }
}

/// Secret fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FetchConfig {
    /// Locations to build regional Secret Manager clients for
    pub regions: Vec<String>,

    /// Upper bound on concurrent backend calls within one mount
    #[validate(range(
        min = 1,
        max = 256,
        message = "Max concurrent fetches must be between 1 and 256"
    ))]
    pub max_concurrent_fetches: usize,

    /// Per-fetch timeout in seconds (0 = none)
    #[validate(range(max = 600, message = "Fetch timeout must be at most 600 seconds"))]
    pub fetch_timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { regions: vec![], max_concurrent_fetches: 8, fetch_timeout_seconds: 0 }
    }
}

impl FetchConfig {
    /// Per-fetch timeout as Duration (None if 0)
    pub fn fetch_timeout(&self) -> Option<Duration> {
        if self.fetch_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.fetch_timeout_seconds))
        }
    }

    /// Create FetchConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let regions = std::env::var("GCP_PROVIDER_REGIONS")
            .map(|s| parse_regions(&s))
            .unwrap_or_default();

        let max_concurrent_fetches = match std::env::var("GCP_PROVIDER_MAX_CONCURRENT_FETCHES") {
            Ok(s) => s.trim().parse::<usize>().map_err(|e| {
                ProviderError::config(format!("Invalid GCP_PROVIDER_MAX_CONCURRENT_FETCHES: {}", e))
            })?,
            Err(_) => defaults.max_concurrent_fetches,
        };

        let fetch_timeout_seconds = match std::env::var("GCP_PROVIDER_FETCH_TIMEOUT_SECONDS") {
            Ok(s) => s.trim().parse::<u64>().map_err(|e| {
                ProviderError::config(format!("Invalid GCP_PROVIDER_FETCH_TIMEOUT_SECONDS: {}", e))
            })?,
            Err(_) => defaults.fetch_timeout_seconds,
        };

        Ok(Self { regions, max_concurrent_fetches, fetch_timeout_seconds })
    }
}

/// Split a comma separated region list, dropping blanks and duplicates
pub fn parse_regions(raw: &str) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for region in raw.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        if !regions.iter().any(|r| r == region) {
            regions.push(region.to_string());
        }
    }
    regions
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to startup logs
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let service_name =
            std::env::var("GCP_PROVIDER_SERVICE_NAME").unwrap_or(defaults.service_name);

        let log_level = std::env::var("GCP_PROVIDER_LOG_LEVEL").unwrap_or(defaults.log_level);

        let json_logging = std::env::var("GCP_PROVIDER_JSON_LOGGING")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.json_logging);

        Self { service_name, log_level, json_logging }
    }
}
