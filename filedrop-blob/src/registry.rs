use std::sync::Arc;

use crate::{
    BlobStore, Catalog, DefaultIdGenerator, FileDescriptor, FileHostConfig, FileHostResult,
    FileListing, FsBlobStore, GetResult, IdGenerator, IncomingFile, JsonFileCatalog,
    QueryService, UploadCoordinator, UploadLink,
};

/// The file registry - what a transport layer embeds
pub struct FileRegistry {
    uploads: UploadCoordinator,
    queries: QueryService,
    config: FileHostConfig,
}

impl FileRegistry {
    /// Create a registry over the given store and catalog
    pub fn new<S, C>(store: S, catalog: C, config: FileHostConfig) -> Self
    where
        S: BlobStore + 'static,
        C: Catalog + 'static,
    {
        Self::with_id_generator(store, catalog, DefaultIdGenerator::new(), config)
    }

    /// Create with a custom id generator
    pub fn with_id_generator<S, C, I>(store: S, catalog: C, ids: I, config: FileHostConfig) -> Self
    where
        S: BlobStore + 'static,
        C: Catalog + 'static,
        I: IdGenerator + 'static,
    {
        let store: Arc<dyn BlobStore> = Arc::new(store);
        let catalog: Arc<dyn Catalog> = Arc::new(catalog);
        let ids: Arc<dyn IdGenerator> = Arc::new(ids);

        Self {
            uploads: UploadCoordinator::new(store.clone(), catalog.clone(), ids, &config),
            queries: QueryService::new(store, catalog),
            config,
        }
    }

    /// Filesystem store plus JSON catalog, both located by `config`
    pub async fn open(config: FileHostConfig) -> FileHostResult<Self> {
        let store = FsBlobStore::new(
            config.upload_root.clone(),
            config.public_base_url.clone(),
            config.serve_prefix.clone(),
        );
        let catalog = JsonFileCatalog::open(config.catalog_path.clone()).await?;
        Ok(Self::new(store, catalog, config))
    }

    /// Store a batch of files
    pub async fn upload(&self, batch: Vec<IncomingFile>) -> FileHostResult<Vec<UploadLink>> {
        self.uploads.upload(batch).await
    }

    /// List every file, newest first, with aggregate stats
    pub async fn list(&self) -> FileHostResult<FileListing> {
        self.queries.list().await
    }

    /// Delete a file by id
    pub async fn delete(&self, id: &str) -> FileHostResult<()> {
        self.queries.delete(id).await
    }

    /// Open a file's blob for reading
    pub async fn open_file(&self, id: &str) -> FileHostResult<(FileDescriptor, GetResult)> {
        self.queries.open(id).await
    }

    /// Get configuration
    pub fn config(&self) -> &FileHostConfig {
        &self.config
    }
}
