//! Tests for the push-only web service backend.

use crate::storage::{
    adapters::WebServiceStorage,
    domain::{ArchiveFilename, LocalArtifact, StorageCapability},
    ports::{StorageBackend, StorageError},
};
use camino::Utf8PathBuf;
use rstest::rstest;

#[rstest]
#[case("", "token")]
#[case("ftp://archive.example.org", "token")]
#[case("https://archive.example.org/upload", "   ")]
fn invalid_settings_are_not_configured(#[case] endpoint: &str, #[case] token: &str) {
    let result = WebServiceStorage::new(endpoint, token);
    assert!(matches!(result, Err(StorageError::NotConfigured(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn web_service_is_never_ready_for_pull() {
    let storage = WebServiceStorage::new("https://archive.example.org/upload", "secret")
        .expect("valid web service settings");
    let filename = ArchiveFilename::new("remote.mbz").expect("valid filename");

    assert!(storage.ready_for_push());
    assert!(!storage.ready_for_pull());
    assert!(matches!(
        storage.pull(&filename).await,
        Err(StorageError::Unsupported {
            operation: StorageCapability::Pull,
            ..
        })
    ));
    assert!(matches!(
        storage.exists(&filename).await,
        Err(StorageError::Unsupported {
            operation: StorageCapability::Exists,
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_source_fails_before_upload() {
    let storage = WebServiceStorage::new("https://archive.example.invalid/upload", "secret")
        .expect("valid web service settings");
    let filename = ArchiveFilename::new("remote.mbz").expect("valid filename");
    let scratch = tempfile::tempdir().expect("temp dir");
    let missing = LocalArtifact::new(
        Utf8PathBuf::from_path_buf(scratch.path().join("absent.mbz")).expect("utf-8 temp path"),
    );

    let result = storage.push(&filename, &missing).await;

    assert!(matches!(result, Err(StorageError::NotFound(_))));
    assert!(storage.last_error().is_some());
}
