//! Backend routing
//!
//! Maps a parsed resource name onto the Secret Manager handle that must serve
//! it: the global handle for names without a location, the handle registered
//! for the location otherwise. An unregistered location is an error; falling
//! back to the global endpoint would read the secret outside its region.

use super::backend::SecretVersionAccessor;
use super::error::RouteError;
use crate::domain::SecretVersionName;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Global handle plus one handle per configured location
///
/// Built once by the caller and shared read-only by every mount request.
#[derive(Clone)]
pub struct ClientSet {
    global: Arc<dyn SecretVersionAccessor>,
    regional: HashMap<String, Arc<dyn SecretVersionAccessor>>,
}

impl std::fmt::Debug for ClientSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut locations: Vec<&String> = self.regional.keys().collect();
        locations.sort();
        f.debug_struct("ClientSet")
            .field("global", &self.global.endpoint())
            .field("regional", &locations)
            .finish()
    }
}

impl ClientSet {
    /// Create a set with only the global handle
    pub fn new(global: Arc<dyn SecretVersionAccessor>) -> Self {
        Self { global, regional: HashMap::new() }
    }

    /// Create a set from a prebuilt region table
    pub fn with_regional(
        global: Arc<dyn SecretVersionAccessor>,
        regional: HashMap<String, Arc<dyn SecretVersionAccessor>>,
    ) -> Self {
        Self { global, regional }
    }

    /// Register the handle for a location, replacing any previous one
    pub fn register_location(
        &mut self,
        location: impl Into<String>,
        client: Arc<dyn SecretVersionAccessor>,
    ) {
        let location = location.into();
        info!(
            location = %location,
            endpoint = %client.endpoint(),
            "Registering regional Secret Manager client"
        );
        self.regional.insert(location, client);
    }

    pub fn has_location(&self, location: &str) -> bool {
        self.regional.contains_key(location)
    }

    /// Registered locations, sorted
    pub fn locations(&self) -> Vec<&str> {
        let mut locations: Vec<&str> = self.regional.keys().map(String::as_str).collect();
        locations.sort_unstable();
        locations
    }

    pub fn global(&self) -> &Arc<dyn SecretVersionAccessor> {
        &self.global
    }

    /// Select the handle that serves `name`
    pub fn route(
        &self,
        name: &SecretVersionName,
    ) -> Result<&Arc<dyn SecretVersionAccessor>, RouteError> {
        match &name.location {
            None => Ok(&self.global),
            Some(location) => self
                .regional
                .get(location)
                .ok_or_else(|| RouteError::UnconfiguredLocation { location: location.clone() }),
        }
    }
}
