//! Domain layer
//!
//! Value objects for mount requests and secret resource names. Nothing in here
//! performs I/O.

pub mod identifier;
pub mod mount;

pub use identifier::{
    is_valid_location, IdentifierError, SecretVersion, SecretVersionName, MAX_LOCATION_LEN,
};
pub use mount::{
    ContentEncoding, KeyExtraction, MountConfig, MountResponse, MountedFile, ObjectVersion,
    PodInfo, SecretConfig,
};
