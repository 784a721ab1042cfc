//! Filesystem blob store.
//!
//! Blobs live flat under a single root directory. Writes stream chunk by chunk into
//! a hidden `.<name>.partial` file which is renamed into place only once the whole
//! payload is on disk, so a reader never sees a half-written blob under its final
//! name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::{
    store::public_url, BlobStore, ByteStream, FileHostError, FileHostResult, GetResult,
    PutResult,
};

/// Blob store backed by a local directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
    serve_prefix: String,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new<P, B, S>(root: P, public_base_url: B, serve_prefix: S) -> Self
    where
        P: Into<PathBuf>,
        B: Into<String>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
            serve_prefix: serve_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob name inside the root. Names are single, non-hidden path
    /// components.
    fn path_for(&self, name: &str) -> std::io::Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', '\0'])
            && name != "..";
        if !valid {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid blob name: {:?}", name),
            ));
        }
        Ok(self.root.join(name))
    }
}

/// Temp file removed on drop unless committed
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, name: &str, mut stream: ByteStream) -> FileHostResult<PutResult> {
        let write_err = |e: std::io::Error| FileHostError::storage_write(name, e);

        let target = self.path_for(name).map_err(write_err)?;
        fs::create_dir_all(&self.root).await.map_err(write_err)?;

        let partial = PartialFile::new(self.root.join(format!(".{}.partial", name)));
        let mut file = fs::File::create(&partial.path).await.map_err(write_err)?;

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(write_err)?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        fs::rename(&partial.path, &target).await.map_err(write_err)?;
        partial.commit();

        tracing::debug!(blob = name, bytes = written, "blob written");
        Ok(PutResult {
            size_bytes: written,
        })
    }

    async fn get(&self, name: &str) -> FileHostResult<GetResult> {
        let path = self
            .path_for(name)
            .map_err(|_| FileHostError::not_found(name))?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileHostError::not_found(name))
            }
            Err(e) => return Err(e.into()),
        };
        let size_bytes = file.metadata().await?.len();

        Ok(GetResult {
            stream: Box::pin(ReaderStream::new(file)),
            size_bytes,
        })
    }

    async fn exists(&self, name: &str) -> FileHostResult<bool> {
        let Ok(path) = self.path_for(name) else {
            return Ok(false);
        };
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, name: &str) -> FileHostResult<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, name: &str) -> String {
        public_url(&self.public_base_url, &self.serve_prefix, name)
    }
}
