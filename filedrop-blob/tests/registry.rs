use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use filedrop_blob::{
    BlobStore, ByteStream, Catalog, FileDescriptor, FileHostConfig, FileHostError,
    FileHostResult, FileRegistry, FileType, FsBlobStore, GetResult, IncomingFile,
    JsonFileCatalog, MemoryCatalog, PutResult,
};

const MIB: u64 = 1024 * 1024;

/// Test factory functions
fn bytes_stream(data: Vec<u8>) -> ByteStream {
    let chunks: Vec<Result<Bytes, std::io::Error>> = data
        .chunks(64 * 1024)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    Box::pin(futures_util::stream::iter(chunks))
}

fn file(name: &str, len: usize) -> IncomingFile {
    IncomingFile::received(name, len as u64, bytes_stream(vec![7u8; len]))
}

fn config(dir: &tempfile::TempDir) -> FileHostConfig {
    FileHostConfig::new()
        .with_upload_root(dir.path().join("uploads"))
        .with_catalog_path(dir.path().join("files.json"))
        .with_public_base_url("http://files.test")
}

async fn open_registry(dir: &tempfile::TempDir) -> FileRegistry {
    FileRegistry::open(config(dir)).await.unwrap()
}

fn stored_names(dir: &tempfile::TempDir) -> Vec<String> {
    match std::fs::read_dir(dir.path().join("uploads")) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Store wrapper failing `put` from the given call onwards, or every `delete`
struct FlakyStore {
    inner: FsBlobStore,
    fail_put_from: usize,
    fail_delete: bool,
    puts: AtomicUsize,
}

#[async_trait]
impl BlobStore for FlakyStore {
    async fn put(&self, name: &str, stream: ByteStream) -> FileHostResult<PutResult> {
        if self.puts.fetch_add(1, Ordering::SeqCst) >= self.fail_put_from {
            return Err(FileHostError::storage_write(
                name,
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ));
        }
        self.inner.put(name, stream).await
    }

    async fn get(&self, name: &str) -> FileHostResult<GetResult> {
        self.inner.get(name).await
    }

    async fn exists(&self, name: &str) -> FileHostResult<bool> {
        self.inner.exists(name).await
    }

    async fn delete(&self, name: &str) -> FileHostResult<()> {
        if self.fail_delete {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked").into());
        }
        self.inner.delete(name).await
    }

    fn url_for(&self, name: &str) -> String {
        self.inner.url_for(name)
    }
}

/// Catalog whose appends always fail
struct ReadOnlyCatalog;

#[async_trait]
impl Catalog for ReadOnlyCatalog {
    async fn append(&self, _descriptor: FileDescriptor) -> FileHostResult<()> {
        Err(FileHostError::catalog_write("read-only file system"))
    }

    async fn list_all(&self) -> FileHostResult<Vec<FileDescriptor>> {
        Ok(Vec::new())
    }

    async fn remove(&self, _id: &str) -> FileHostResult<Option<FileDescriptor>> {
        Ok(None)
    }
}

fn flaky(dir: &tempfile::TempDir, fail_put_from: usize, fail_delete: bool) -> FlakyStore {
    FlakyStore {
        inner: FsBlobStore::new(dir.path().join("uploads"), "http://files.test", "uploads"),
        fail_put_from,
        fail_delete,
        puts: AtomicUsize::new(0),
    }
}

#[tokio::test]
async fn uploaded_files_are_listed_with_transmitted_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    let links = registry
        .upload(vec![file("cat.png", 1500), file("song.MP3", 0), file("notes.txt", 70_000)])
        .await
        .unwrap();

    assert_eq!(links.len(), 3);
    assert_eq!(links[0].name, "cat.png");
    assert_eq!(links[0].file_type, FileType::Image);
    assert_eq!(links[1].file_type, FileType::Audio);
    assert!(links[0].url.starts_with("http://files.test/uploads/"));
    assert!(links[0].url.ends_with(".png"));

    let listing = registry.list().await.unwrap();
    assert_eq!(listing.stats.total_files, 3);
    let mut sizes: Vec<_> = listing.files.iter().map(|f| (f.name.as_str(), f.size)).collect();
    sizes.sort();
    assert_eq!(sizes, [("cat.png", 1500), ("notes.txt", 70_000), ("song.MP3", 0)]);

    for view in &listing.files {
        assert_eq!(links.iter().find(|l| l.name == view.name).unwrap().url, view.url);
    }
}

#[tokio::test]
async fn last_extension_is_matched_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    let links = registry.upload(vec![file("report.final.PDF", 10)]).await.unwrap();
    assert_eq!(links[0].file_type, FileType::Document);
    assert!(links[0].url.ends_with(".pdf"));
}

#[tokio::test]
async fn unknown_extensions_are_stored_as_documents() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    let links = registry
        .upload(vec![file("archive.xyz", 10), file("Makefile", 4)])
        .await
        .unwrap();
    assert!(links.iter().all(|l| l.file_type == FileType::Document));
    assert_eq!(registry.list().await.unwrap().stats.total_files, 2);
}

#[tokio::test]
async fn oversize_file_rejects_the_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    let big = IncomingFile::received("movie.mp4", 25 * MIB, bytes_stream(Vec::new()));
    let err = registry
        .upload(vec![file("small.txt", 1024), big])
        .await
        .unwrap_err();

    assert!(matches!(err, FileHostError::FileTooLarge { ref name, .. } if name == "movie.mp4"));
    assert_eq!(registry.list().await.unwrap().stats.total_files, 0);
    assert!(stored_names(&dir).is_empty());
}

#[tokio::test]
async fn max_file_size_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FileRegistry::open(config(&dir).with_max_file_size(100)).await.unwrap();

    assert!(registry.upload(vec![file("ok.txt", 100)]).await.is_ok());
    let err = registry.upload(vec![file("big.txt", 101)]).await.unwrap_err();
    assert!(matches!(err, FileHostError::FileTooLarge { size: 101, max: 100, .. }));
}

#[tokio::test]
async fn payload_larger_than_declared_is_not_stored_past_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FileRegistry::open(config(&dir).with_max_file_size(1000)).await.unwrap();

    let liar = IncomingFile::received("liar.bin", 10, bytes_stream(vec![1u8; 5000]));
    let err = registry.upload(vec![liar]).await.unwrap_err();

    assert!(matches!(err, FileHostError::StorageWrite { .. }));
    assert_eq!(registry.list().await.unwrap().stats.total_files, 0);
    assert!(stored_names(&dir).is_empty());
}

#[tokio::test]
async fn failed_transfers_are_skipped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    let links = registry
        .upload(vec![
            file("a.txt", 3),
            IncomingFile::failed("truncated.zip", "connection reset"),
            file("b.txt", 4),
        ])
        .await
        .unwrap();

    let names: Vec<_> = links.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
    assert_eq!(registry.list().await.unwrap().stats.total_files, 2);
}

#[tokio::test]
async fn empty_batch_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    let err = registry.upload(Vec::new()).await.unwrap_err();
    assert!(matches!(err, FileHostError::Validation { .. }));
    assert_eq!(err.to_string(), "No files uploaded");
}

#[tokio::test]
async fn storage_failure_keeps_earlier_files_of_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = JsonFileCatalog::open(dir.path().join("files.json")).await.unwrap();
    let registry = FileRegistry::new(flaky(&dir, 1, false), catalog, config(&dir));

    let err = registry
        .upload(vec![file("first.txt", 5), file("second.txt", 5), file("third.txt", 5)])
        .await
        .unwrap_err();

    assert!(matches!(err, FileHostError::StorageWrite { ref name, .. } if name == "second.txt"));
    let listing = registry.list().await.unwrap();
    assert_eq!(listing.stats.total_files, 1);
    assert_eq!(listing.files[0].name, "first.txt");
    assert_eq!(stored_names(&dir).len(), 1);
}

#[tokio::test]
async fn catalog_failure_leaves_an_orphaned_blob() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FileRegistry::new(flaky(&dir, usize::MAX, false), ReadOnlyCatalog, config(&dir));

    let err = registry.upload(vec![file("a.txt", 5)]).await.unwrap_err();

    assert!(matches!(err, FileHostError::CatalogWrite { .. }));
    assert_eq!(stored_names(&dir).len(), 1);
}

#[tokio::test]
async fn deleted_files_disappear_and_cannot_be_deleted_twice() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;
    registry.upload(vec![file("keep.txt", 3), file("drop.png", 9)]).await.unwrap();

    let listing = registry.list().await.unwrap();
    let target = listing.files.iter().find(|f| f.name == "drop.png").unwrap();
    let id = target.id.as_str().to_string();
    let (descriptor, _) = registry.open_file(&id).await.unwrap();

    registry.delete(&id).await.unwrap();

    let listing = registry.list().await.unwrap();
    assert_eq!(listing.stats.total_files, 1);
    assert_eq!(listing.files[0].name, "keep.txt");
    assert!(matches!(
        registry.open_file(&id).await,
        Err(FileHostError::NotFound { .. })
    ));
    assert!(!stored_names(&dir).contains(&descriptor.stored_name));

    let err = registry.delete(&id).await.unwrap_err();
    assert!(matches!(err, FileHostError::NotFound { .. }));
}

#[tokio::test]
async fn delete_tolerates_an_already_missing_blob() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;
    registry.upload(vec![file("gone.txt", 3)]).await.unwrap();
    let id = registry.list().await.unwrap().files[0].id.as_str().to_string();

    for name in stored_names(&dir) {
        std::fs::remove_file(dir.path().join("uploads").join(name)).unwrap();
    }

    registry.delete(&id).await.unwrap();
    assert_eq!(registry.list().await.unwrap().stats.total_files, 0);
}

#[tokio::test]
async fn blob_removal_failure_does_not_fail_the_delete() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FileRegistry::new(
        flaky(&dir, usize::MAX, true),
        MemoryCatalog::new(),
        config(&dir),
    );
    registry.upload(vec![file("stuck.txt", 3)]).await.unwrap();
    let id = registry.list().await.unwrap().files[0].id.as_str().to_string();

    registry.delete(&id).await.unwrap();
    assert_eq!(registry.list().await.unwrap().stats.total_files, 0);
}

#[tokio::test]
async fn blank_id_on_delete_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    let err = registry.delete("  ").await.unwrap_err();
    assert!(matches!(err, FileHostError::Validation { .. }));
}

#[tokio::test]
async fn stats_sum_all_entries() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    registry
        .upload(vec![
            file("a.bin", 0),
            file("b.bin", 1023),
            file("c.bin", 1024),
            file("d.bin", 1_048_576),
        ])
        .await
        .unwrap();

    let stats = registry.list().await.unwrap().stats;
    assert_eq!(stats.total_files, 4);
    assert_eq!(stats.total_size, "1.00 MB");
}

#[tokio::test]
async fn empty_catalog_renders_zero_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let stats = open_registry(&dir).await.list().await.unwrap().stats;
    assert_eq!(stats.total_files, 0);
    assert_eq!(stats.total_size, "0 B");
}

#[tokio::test]
async fn listing_is_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_registry(&dir).await;

    for name in ["one.txt", "two.txt", "three.txt"] {
        registry.upload(vec![file(name, 1)]).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let names: Vec<_> = registry
        .list()
        .await
        .unwrap()
        .files
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, ["three.txt", "two.txt", "one.txt"]);
}

#[tokio::test]
async fn catalog_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let links = open_registry(&dir)
        .await
        .upload(vec![file("persist.txt", 12)])
        .await
        .unwrap();

    let reopened = open_registry(&dir).await;
    let listing = reopened.list().await.unwrap();
    assert_eq!(listing.stats.total_files, 1);
    assert_eq!(listing.files[0].url, links[0].url);

    let (_, blob) = reopened.open_file(listing.files[0].id.as_str()).await.unwrap();
    assert_eq!(blob.size_bytes, 12);
    let body: Vec<u8> = blob
        .stream
        .map(|c| c.unwrap().to_vec())
        .concat()
        .await;
    assert_eq!(body, vec![7u8; 12]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(open_registry(&dir).await);

    let tasks: Vec<_> = (0..24)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.upload(vec![file(&format!("f{i}.txt"), 16)]).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let listing = registry.list().await.unwrap();
    assert_eq!(listing.stats.total_files, 24);
    let ids: HashSet<_> = listing.files.iter().map(|f| f.id.clone()).collect();
    assert_eq!(ids.len(), 24);
    assert_eq!(stored_names(&dir).len(), 24);

    let reopened = open_registry(&dir).await;
    assert_eq!(reopened.list().await.unwrap().stats.total_files, 24);
}
