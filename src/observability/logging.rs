//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! The filter comes from `RUST_LOG` when set, else from the configured log
//! level. JSON output includes the current span and its parents, so every event
//! logged while resolving a mount carries the pod and request id fields of
//! [`mount_span!`](crate::mount_span).

use crate::config::ObservabilityConfig;
use crate::errors::{ProviderError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Create a tracing span for one mount request.
///
/// Carries the pod identity and a fresh request id. Extra fields can be
/// appended:
///
/// ```rust,ignore
/// let span = mount_span!(config.pod_info, secrets = config.secrets.len());
/// ```
#[macro_export]
macro_rules! mount_span {
    ($pod:expr) => {
        tracing::info_span!(
            "mount",
            pod_namespace = %$pod.namespace,
            pod_name = %$pod.name,
            pod_uid = %$pod.uid,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($pod:expr, $($field:tt)*) => {
        tracing::info_span!(
            "mount",
            pod_namespace = %$pod.namespace,
            pod_name = %$pod.name,
            pod_uid = %$pod.uid,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Build the level filter, `RUST_LOG` taking precedence
pub fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.log_level).map_err(|e| {
            ProviderError::config_with_source(
                format!("Invalid log level \"{}\"", config.log_level),
                Box::new(e),
            )
        })
    })
}

/// Install the global subscriber
///
/// A subscriber installed earlier (e.g. by a test harness) is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let installed = if config.json_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::ProviderConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        version = %crate::VERSION,
        regions = ?config.fetch.regions,
        max_concurrent_fetches = config.fetch.max_concurrent_fetches,
        fetch_timeout_seconds = config.fetch.fetch_timeout_seconds,
        json_logging = config.observability.json_logging,
        "Secret Manager provider configuration"
    );
}
