//! Tests for the shared-disk storage backend.

use crate::storage::{
    adapters::SharedDiskStorage,
    domain::{ArchiveFilename, LocalArtifact},
    ports::{StorageBackend, StorageError},
};
use camino::{Utf8Path, Utf8PathBuf};
use eyre::{ensure, eyre};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Disk {
    _root: TempDir,
    shared: Utf8PathBuf,
    scratch: Utf8PathBuf,
}

impl Disk {
    fn open(&self) -> SharedDiskStorage {
        SharedDiskStorage::open(&self.shared, &self.shared).expect("shared disk should open")
    }

    fn write_scratch(&self, name: &str, content: &[u8]) -> LocalArtifact {
        let path = self.scratch.join(name);
        std::fs::write(&path, content).expect("scratch file should be written");
        LocalArtifact::new(path)
    }
}

#[fixture]
fn disk() -> Disk {
    let root = tempfile::tempdir().expect("temp dir");
    let base = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).expect("utf-8 temp dir");
    let shared = base.join("shared");
    let scratch = base.join("scratch");
    std::fs::create_dir_all(&shared).expect("shared dir");
    std::fs::create_dir_all(&scratch).expect("scratch dir");
    Disk {
        _root: root,
        shared,
        scratch,
    }
}

fn filename(name: &str) -> ArchiveFilename {
    ArchiveFilename::new(name).expect("valid filename")
}

#[rstest]
#[case("", "/srv/restore")]
#[case("/srv/save", "  ")]
fn blank_directories_are_not_configured(#[case] save_to: &str, #[case] restore_from: &str) {
    let result = SharedDiskStorage::open(Utf8Path::new(save_to), Utf8Path::new(restore_from));
    assert!(matches!(result, Err(StorageError::NotConfigured(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn push_then_pull_yields_staged_copy(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("course.mbz");
    let source = disk.write_scratch("local.mbz", b"course archive");

    storage.push(&name, &source).await?;
    let pulled = storage.pull(&name).await?;

    ensure!(pulled.read()? == b"course archive", "pulled content should match");
    ensure!(
        !pulled.path().starts_with(&disk.shared),
        "pull should stage a copy outside the shared directory"
    );
    ensure!(storage.exists(&name).await?, "authoritative copy should remain");
    ensure!(
        !disk.shared.join(name.partial_name()).exists(),
        "no partial file should remain"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pulling_twice_replaces_staged_copy(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("twice.mbz");
    std::fs::write(disk.shared.join(name.as_str()), b"first")?;
    storage.pull(&name).await?;

    std::fs::write(disk.shared.join(name.as_str()), b"second")?;
    let pulled = storage.pull(&name).await?;

    ensure!(pulled.read()? == b"second", "second pull should refresh the copy");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repushing_identical_content_is_a_no_op(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("same.mbz");
    let source = disk.write_scratch("same.mbz", b"identical");

    storage.push(&name, &source).await?;
    let target = disk.shared.join(name.as_str());
    let first_modified = std::fs::metadata(&target)?.modified()?;
    storage.push(&name, &source).await?;
    let second_modified = std::fs::metadata(&target)?.modified()?;

    ensure!(first_modified == second_modified, "identical push should not rewrite");
    ensure!(std::fs::read(&target)? == b"identical", "content should be unchanged");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pushing_new_content_replaces_archive(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("changed.mbz");

    storage.push(&name, &disk.write_scratch("a.mbz", b"old")).await?;
    storage.push(&name, &disk.write_scratch("b.mbz", b"new")).await?;

    ensure!(
        std::fs::read(disk.shared.join(name.as_str()))? == b"new",
        "archive should hold the latest content"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pulling_missing_archive_records_readable_detail(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("absent.mbz");

    let result = storage.pull(&name).await;

    ensure!(matches!(result, Err(StorageError::NotFound(_))), "pull should fail");
    let detail = storage
        .last_error()
        .ok_or_else(|| eyre!("failure detail should be recorded"))?;
    ensure!(
        detail.starts_with(
            "Cannot read file. Either the file does not exist or there is a permission problem."
        ),
        "unexpected detail: {detail}"
    );
    ensure!(detail.contains("absent.mbz"), "detail should name the file");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_archive(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("gone.mbz");
    std::fs::write(disk.shared.join(name.as_str()), b"bytes")?;

    storage.delete(&name).await?;

    ensure!(!storage.exists(&name).await?, "archive should be gone");
    let second = storage.delete(&name).await;
    ensure!(
        matches!(second, Err(StorageError::NotFound(_))),
        "deleting twice should report the missing archive"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn multi_megabyte_archive_is_copied_intact(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("large.mbz");
    let content = b"0123456789abcdef".repeat(256 * 1024);
    let source = disk.write_scratch("large.mbz", &content);

    storage.push(&name, &source).await?;
    storage.push(&name, &source).await?;

    let stored = std::fs::read(disk.shared.join(name.as_str()))?;
    ensure!(stored.len() == content.len(), "stored size should match");
    ensure!(stored == content, "stored bytes should match");
    ensure!(
        !disk.shared.join(name.partial_name()).exists(),
        "no partial file should remain"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pushing_unreadable_source_keeps_existing_archive(disk: Disk) -> eyre::Result<()> {
    let storage = disk.open();
    let name = filename("kept.mbz");
    std::fs::write(disk.shared.join(name.as_str()), b"original")?;
    let missing = LocalArtifact::new(disk.scratch.join("never-written.mbz"));

    let result = storage.push(&name, &missing).await;

    ensure!(
        matches!(result, Err(StorageError::Transport(_))),
        "unreadable source should be a transport failure"
    );
    ensure!(storage.last_error().is_some(), "failure detail should be recorded");
    ensure!(
        std::fs::read(disk.shared.join(name.as_str()))? == b"original",
        "existing archive should be untouched"
    );
    ensure!(
        !disk.shared.join(name.partial_name()).exists(),
        "no partial file should remain"
    );
    Ok(())
}
