//! The catalog: an ordered, append-only registry of file descriptors.
//!
//! [`JsonFileCatalog`] keeps the current sequence in memory behind a single async
//! mutex and checkpoints it to a JSON file after every mutation. The checkpoint is
//! written to a sibling temp file and renamed over the catalog, so a reader of the
//! file sees either the old or the new sequence. The in-memory view only changes
//! once the rename succeeded, which keeps it identical to what is on disk whether
//! the write succeeds, fails, or its caller goes away halfway.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{FileDescriptor, FileHostError, FileHostResult};

/// Metadata registry operations
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Add one descriptor at the end of the sequence
    async fn append(&self, descriptor: FileDescriptor) -> FileHostResult<()>;

    /// Every current descriptor, in insertion order
    async fn list_all(&self) -> FileHostResult<Vec<FileDescriptor>>;

    /// Remove the descriptor with this id, returning it if it existed
    async fn remove(&self, id: &str) -> FileHostResult<Option<FileDescriptor>>;
}

fn ensure_unique(entries: &[FileDescriptor], descriptor: &FileDescriptor) -> FileHostResult<()> {
    if entries.iter().any(|d| d.id == descriptor.id) {
        return Err(FileHostError::catalog_write(format!(
            "duplicate file id {}",
            descriptor.id
        )));
    }
    Ok(())
}

/// Catalog persisted as a JSON array
#[derive(Debug)]
pub struct JsonFileCatalog {
    file: Arc<CatalogFile>,
}

#[derive(Debug)]
struct CatalogFile {
    path: PathBuf,
    entries: Mutex<Vec<FileDescriptor>>,
}

impl JsonFileCatalog {
    /// Open the catalog at `path`, loading existing entries. A missing file is an
    /// empty catalog.
    pub async fn open<P: Into<PathBuf>>(path: P) -> FileHostResult<Self> {
        let path = path.into();
        let entries = match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            catalog = %path.display(),
            files = entries.len(),
            "catalog loaded"
        );

        Ok(Self {
            file: Arc::new(CatalogFile {
                path,
                entries: Mutex::new(entries),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    /// Apply `change` to the current sequence and persist the result.
    ///
    /// The lock, the write and the in-memory swap run on their own task, so
    /// dropping the returned future never leaves the file ahead of memory.
    /// `change` returns the next sequence, or `None` to leave the catalog as is.
    async fn commit<T, F>(&self, change: F) -> FileHostResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&[FileDescriptor]) -> FileHostResult<(Option<Vec<FileDescriptor>>, T)>
            + Send
            + 'static,
    {
        let file = self.file.clone();
        tokio::spawn(async move {
            let mut entries = file.entries.lock().await;
            let (next, output) = change(&entries)?;
            if let Some(next) = next {
                file.persist(&next).await?;
                *entries = next;
            }
            Ok::<T, FileHostError>(output)
        })
        .await
        .map_err(|e| FileHostError::catalog_write(format!("catalog update aborted: {}", e)))?
    }
}

impl CatalogFile {
    /// Write the full sequence through a temp file and rename it into place
    async fn persist(&self, entries: &[FileDescriptor]) -> FileHostResult<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| FileHostError::catalog_write(e.to_string()))?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog".into());
        tmp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        let tmp = self.path.with_file_name(tmp_name);

        let result = async {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp).await;
            return Err(FileHostError::catalog_write(format!(
                "{}: {}",
                self.path.display(),
                e
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for JsonFileCatalog {
    async fn append(&self, descriptor: FileDescriptor) -> FileHostResult<()> {
        self.commit(move |entries| {
            ensure_unique(entries, &descriptor)?;
            let mut next = entries.to_vec();
            next.push(descriptor);
            Ok((Some(next), ()))
        })
        .await
    }

    async fn list_all(&self) -> FileHostResult<Vec<FileDescriptor>> {
        Ok(self.file.entries.lock().await.clone())
    }

    async fn remove(&self, id: &str) -> FileHostResult<Option<FileDescriptor>> {
        let id = id.to_string();
        self.commit(move |entries| {
            let Some(index) = entries.iter().position(|d| d.id.as_str() == id) else {
                return Ok((None, None));
            };
            let mut next = entries.to_vec();
            let removed = next.remove(index);
            Ok((Some(next), Some(removed)))
        })
        .await
    }
}

/// Non-durable catalog, for tests and ephemeral deployments
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: Mutex<Vec<FileDescriptor>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn append(&self, descriptor: FileDescriptor) -> FileHostResult<()> {
        let mut entries = self.entries.lock().await;
        ensure_unique(&entries, &descriptor)?;
        entries.push(descriptor);
        Ok(())
    }

    async fn list_all(&self) -> FileHostResult<Vec<FileDescriptor>> {
        Ok(self.entries.lock().await.clone())
    }

    async fn remove(&self, id: &str) -> FileHostResult<Option<FileDescriptor>> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .position(|d| d.id.as_str() == id)
            .map(|index| entries.remove(index)))
    }
}
