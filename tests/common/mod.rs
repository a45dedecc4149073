//! Common test utilities for all integration tests.
//!
//! Provides in-memory Secret Manager handles and mount request builders.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use gcp_secrets_csi_provider::domain::{MountConfig, PodInfo, SecretConfig};
use gcp_secrets_csi_provider::secrets::{ClientSet, InMemorySecretBackend};
use gcp_secrets_csi_provider::services::MountResolver;
use std::sync::Arc;

pub const SECRET: &str = "projects/project/secrets/test";
pub const SECRET_LATEST: &str = "projects/project/secrets/test/versions/latest";

pub fn pod_info() -> PodInfo {
    PodInfo {
        namespace: "default".to_string(),
        name: "mypod".to_string(),
        uid: "123".to_string(),
        service_account: "test-sa".to_string(),
    }
}

pub fn mount(secrets: Vec<SecretConfig>) -> MountConfig {
    MountConfig::new(secrets, 777, pod_info())
}

/// Global backend holding `payload` as version 2 of [`SECRET`]
pub fn global_backend(payload: &str) -> InMemorySecretBackend {
    let backend = InMemorySecretBackend::new("global");
    backend.add_version(SECRET, "initial");
    backend.add_version(SECRET, payload);
    backend
}

/// Resolver over `global` plus one handle per `(location, backend)` pair
pub fn resolver(
    global: &InMemorySecretBackend,
    regional: &[(&str, &InMemorySecretBackend)],
) -> MountResolver {
    let mut clients = ClientSet::new(Arc::new(global.clone()));
    for (location, backend) in regional {
        clients.register_location(*location, Arc::new((*backend).clone()));
    }
    MountResolver::new(clients)
}
