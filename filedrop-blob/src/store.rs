use async_trait::async_trait;

use crate::{ByteStream, FileHostResult};

/// Core blob storage operations - must be implemented by all storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist a stream under `name`. Nothing is visible under `name` unless the
    /// whole stream was written.
    async fn put(&self, name: &str, stream: ByteStream) -> FileHostResult<PutResult>;

    /// Open a stored blob for reading
    async fn get(&self, name: &str) -> FileHostResult<GetResult>;

    /// Whether a blob is stored under `name`
    async fn exists(&self, name: &str) -> FileHostResult<bool>;

    /// Delete a blob. Deleting an absent blob succeeds.
    async fn delete(&self, name: &str) -> FileHostResult<()>;

    /// Public locator for a stored blob
    fn url_for(&self, name: &str) -> String;
}

/// Result of a successful put operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    pub size_bytes: u64,
}

/// Result of a get operation
pub struct GetResult {
    pub stream: ByteStream,
    pub size_bytes: u64,
}

impl std::fmt::Debug for GetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetResult")
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Join a serving base address, prefix and blob name into a url
pub fn public_url(base_url: &str, prefix: &str, name: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", base, name)
    } else {
        format!("{}/{}/{}", base, prefix, name)
    }
}
