//! End-to-end mount resolution against in-memory Secret Manager handles.

mod common;

use common::{global_backend, mount, resolver, SECRET, SECRET_LATEST};
use gcp_secrets_csi_provider::config::MountParams;
use gcp_secrets_csi_provider::domain::{ContentEncoding, MountedFile, ObjectVersion, SecretConfig};
use gcp_secrets_csi_provider::secrets::{
    BackendError, InMemorySecretBackend, ResolveError, RouteError, StatusCode,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

const REGIONAL_SECRET: &str = "projects/project/locations/us-central1/secrets/test";
const REGIONAL_LATEST: &str = "projects/project/locations/us-central1/secrets/test/versions/latest";

#[traced_test]
#[tokio::test]
async fn test_handle_mount_event() {
    let backend = global_backend("My Secret");
    let config = mount(vec![
        SecretConfig::new(SECRET_LATEST, "good1.txt"),
        SecretConfig::new(SECRET_LATEST, "good2.txt").with_mode(0o600),
    ]);

    let response = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap();

    let version = ObjectVersion {
        id: SECRET_LATEST.to_string(),
        version: "projects/project/secrets/test/versions/2".to_string(),
    };
    assert_eq!(response.object_versions, vec![version.clone(), version]);
    assert_eq!(
        response.files,
        vec![
            MountedFile {
                path: "good1.txt".to_string(),
                mode: 777,
                contents: b"My Secret".to_vec(),
            },
            MountedFile {
                path: "good2.txt".to_string(),
                mode: 384,
                contents: b"My Secret".to_vec(),
            },
        ]
    );
    assert_eq!(backend.access_count(), 2);
    assert!(logs_contain("Mount resolved"));
    assert!(!logs_contain("My Secret"));
}

#[tokio::test]
async fn test_handle_mount_event_sm_error() {
    let backend = global_backend("My Secret");
    backend.fail_with(
        SECRET_LATEST,
        BackendError::new(StatusCode::FailedPrecondition, "Secret is Disabled"),
    );

    let config = mount(vec![SecretConfig::new(SECRET_LATEST, "good1.txt")]);
    let err = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("FailedPrecondition"), "{}", err);
    assert!(err.to_string().contains("Secret is Disabled"), "{}", err);
}

#[tokio::test]
async fn test_handle_mount_event_invalid_locations() {
    let backend = global_backend("My Secret");
    let config = mount(vec![
        SecretConfig::new(
            "projects/project/locations/very_very_very_very_very_very_very_very_long_location/secrets/test/versions/latest",
            "good1.txt",
        ),
        SecretConfig::new(
            "projects/project/locations/split/location/secrets/test/versions/latest",
            "good1.txt",
        ),
    ]);

    let err = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("invalid location"), "{}", text);
    assert!(text.contains("Invalid secret resource name"), "{}", text);
    assert_eq!(err.len(), 2);
    for failure in err.failures() {
        assert_eq!(failure.cause.kind(), "invalid_location");
    }
    assert_eq!(backend.access_count(), 0);
}

#[tokio::test]
async fn test_handle_mount_event_sm_multiple_errors() {
    let backend = InMemorySecretBackend::new("global");
    backend.add_version("projects/project/secrets/test-a", "good data");
    backend.add_version("projects/project/secrets/test-a", "disabled data");
    backend.add_version("projects/project/secrets/test-b", "hidden");
    backend.fail_with(
        "projects/project/secrets/test-a/versions/2",
        BackendError::new(StatusCode::FailedPrecondition, "Secret is Disabled"),
    );
    backend.fail_with(
        "projects/project/secrets/test-b/versions/latest",
        BackendError::new(StatusCode::PermissionDenied, "User does not have permission on secret"),
    );

    let config = mount(vec![
        SecretConfig::new("projects/project/secrets/test-a/versions/1", "good1.txt"),
        SecretConfig::new("projects/project/secrets/test-a/versions/2", "bad1.txt"),
        SecretConfig::new("projects/project/secrets/test-b/versions/latest", "bad2.txt"),
    ]);

    let err = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("FailedPrecondition"), "{}", text);
    assert!(text.contains("PermissionDenied"), "{}", text);
    assert_eq!(err.len(), 2);
    assert_eq!(err.total(), 3);
    assert_eq!(err.failures()[0].index, 1);
    assert_eq!(err.failures()[1].index, 2);
    assert_eq!(backend.access_count(), 3);
}

#[tokio::test]
async fn test_handle_mount_event_for_regional_secret() {
    let global = InMemorySecretBackend::new("global");
    global.add_version(REGIONAL_SECRET, "Global Secret");
    let regional = InMemorySecretBackend::new("us-central1");
    regional.add_version(REGIONAL_SECRET, "My Secret");

    let config = mount(vec![SecretConfig::new(REGIONAL_LATEST, "good1.txt")]);
    let response = resolver(&global, &[("us-central1", &regional)])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.files[0].contents, b"My Secret".to_vec());
    assert_eq!(
        response.object_versions[0].version,
        "projects/project/locations/us-central1/secrets/test/versions/1"
    );
    assert_eq!(global.access_count(), 0);
    assert_eq!(regional.access_count(), 1);
}

#[tokio::test]
async fn test_unconfigured_location_is_not_sent_to_global() {
    let global = InMemorySecretBackend::new("global");
    global.add_version(REGIONAL_SECRET, "Global Secret");

    let config = mount(vec![SecretConfig::new(REGIONAL_LATEST, "good1.txt")]);
    let err = resolver(&global, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap_err();

    match &err.failures()[0].cause {
        ResolveError::Route(RouteError::UnconfiguredLocation { location }) => {
            assert_eq!(location, "us-central1")
        }
        other => panic!("unexpected failure: {}", other),
    }
    assert_eq!(global.access_count(), 0);
}

#[tokio::test]
async fn test_handle_mount_event_with_encoding() {
    let encoded = global_backend("SGVsbG8gV29ybGQ=");
    let config = mount(vec![
        SecretConfig::new(SECRET_LATEST, "encoded.txt").with_encoding(ContentEncoding::Base64)
    ]);
    let response = resolver(&encoded, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.files[0].contents, b"Hello World".to_vec());

    let plain = global_backend("raw secret data");
    let config = mount(vec![SecretConfig::new(SECRET_LATEST, "plain.txt")]);
    let response =
        resolver(&plain, &[]).handle_mount_event(&config, &CancellationToken::new()).await.unwrap();
    assert_eq!(response.files[0].contents, b"raw secret data".to_vec());
    assert_eq!(response.files[0].mode, 777);
}

#[tokio::test]
async fn test_key_extraction() {
    let backend = InMemorySecretBackend::new("global");
    backend.add_version("projects/project/secrets/json", r#"{"user": "admin", "port": 5432}"#);
    backend.add_version("projects/project/secrets/yaml", "user: admin\nport: 5432\n");

    let config = mount(vec![
        SecretConfig::new("projects/project/secrets/json/versions/1", "user").with_json_key("user"),
        SecretConfig::new("projects/project/secrets/yaml/versions/1", "port").with_yaml_key("port"),
    ]);
    let response = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.files[0].contents, b"admin".to_vec());
    assert_eq!(response.files[1].contents, b"5432".to_vec());

    let config = mount(vec![SecretConfig::new("projects/project/secrets/json/versions/1", "pw")
        .with_json_key("password")]);
    let err = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("\"password\""), "{}", err);
}

#[tokio::test]
async fn test_nested_path_is_kept() {
    let backend = global_backend("My Secret");
    let config =
        mount(vec![SecretConfig::new(SECRET_LATEST, "ignored").with_path("nested/dir/secret")]);
    let response = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.files[0].path, "nested/dir/secret");
}

#[tokio::test]
async fn test_zero_padded_version_is_not_rewritten() {
    let backend = global_backend("My Secret");
    backend.fail_with(
        "projects/project/secrets/test/versions/01",
        BackendError::new(StatusCode::PermissionDenied, "padded id reached the backend"),
    );

    let config = mount(vec![SecretConfig::new("projects/project/secrets/test/versions/01", "a")]);
    let err = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.failures()[0].cause.kind(), "invalid_resource_name");
    assert!(err.to_string().contains("leading zeros"), "{}", err);
    assert_eq!(backend.access_count(), 0);
}

#[tokio::test]
async fn test_secret_without_destination_fails() {
    let backend = global_backend("My Secret");
    let mut orphan = SecretConfig::new(SECRET_LATEST, "unused");
    orphan.file_name = None;
    let config = mount(vec![SecretConfig::new(SECRET_LATEST, "good1.txt"), orphan]);

    let err = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.len(), 1);
    assert_eq!(err.failures()[0].index, 1);
    assert!(matches!(err.failures()[0].cause, ResolveError::MissingDestination));
    assert_eq!(backend.access_count(), 1);
}

#[tokio::test]
async fn test_empty_request_resolves_to_empty_response() {
    let backend = global_backend("My Secret");
    let response = resolver(&backend, &[])
        .handle_mount_event(&mount(vec![]), &CancellationToken::new())
        .await
        .unwrap();
    assert!(response.files.is_empty());
    assert!(response.object_versions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_order_is_kept_under_concurrency() {
    let fast = InMemorySecretBackend::new("global");
    let slow = InMemorySecretBackend::new("us-central1").with_latency(Duration::from_secs(2));
    fast.add_version("projects/project/secrets/fast", "fast");
    slow.add_version("projects/project/locations/us-central1/secrets/slow", "slow");

    let config = mount(vec![
        SecretConfig::new("projects/project/locations/us-central1/secrets/slow/versions/1", "slow"),
        SecretConfig::new("projects/project/secrets/fast/versions/1", "fast"),
        SecretConfig::new(
            "projects/project/locations/us-central1/secrets/slow/versions/1",
            "slow2",
        ),
    ]);

    let response = resolver(&fast, &[("us-central1", &slow)])
        .with_max_concurrent_fetches(3)
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap();

    let paths: Vec<&str> = response.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["slow", "fast", "slow2"]);
    assert_eq!(response.files[1].contents, b"fast".to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_reaches_in_flight_fetches() {
    let slow = InMemorySecretBackend::new("global").with_latency(Duration::from_secs(60));
    slow.add_version(SECRET, "My Secret");

    let config = mount(vec![
        SecretConfig::new(SECRET_LATEST, "a"),
        SecretConfig::new(SECRET_LATEST, "b"),
    ]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = resolver(&slow, &[]).handle_mount_event(&config, &cancel).await.unwrap_err();

    assert_eq!(err.len(), 2);
    for failure in err.failures() {
        assert!(matches!(failure.cause, ResolveError::Cancelled));
    }
}

#[tokio::test]
async fn test_mount_from_attributes() {
    let backend = global_backend("My Secret");
    let params = MountParams {
        attributes: serde_json::json!({
            "secrets": "- resourceName: projects/project/secrets/test/versions/latest\n  fileName: good1.txt\n  mode: 384\n",
            "csi.storage.k8s.io/pod.namespace": "default",
            "csi.storage.k8s.io/pod.name": "mypod",
        })
        .to_string(),
        target_path: "/tmp/mount".to_string(),
        permissions: "420".to_string(),
    };

    let config = params.parse().unwrap();
    let response = resolver(&backend, &[])
        .handle_mount_event(&config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.files[0].path, "good1.txt");
    assert_eq!(response.files[0].mode, 384);
    assert_eq!(config.pod_info.name, "mypod");
}
