use std::sync::Arc;

use crate::{
    format::format_size, BlobStore, Catalog, FileDescriptor, FileHostError, FileHostResult,
    FileListing, FileStats, FileView, GetResult,
};

/// Lists the catalog and removes files from it
pub struct QueryService {
    store: Arc<dyn BlobStore>,
    catalog: Arc<dyn Catalog>,
}

impl QueryService {
    pub fn new(store: Arc<dyn BlobStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Every file, newest first, with totals over the whole catalog
    pub async fn list(&self) -> FileHostResult<FileListing> {
        let mut descriptors = self.catalog.list_all().await?;
        let total_size: u64 = descriptors.iter().map(|d| d.size).sum();

        // Stable sort: equal timestamps keep insertion order.
        descriptors.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

        let files: Vec<FileView> = descriptors.into_iter().map(|d| self.view(d)).collect();
        Ok(FileListing {
            stats: FileStats {
                total_files: files.len(),
                total_size: format_size(total_size),
            },
            files,
        })
    }

    /// Remove a file from the catalog, then its blob.
    ///
    /// The catalog removal decides the outcome. A blob that cannot be removed
    /// afterwards is logged and otherwise ignored.
    pub async fn delete(&self, id: &str) -> FileHostResult<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FileHostError::validation("File ID not provided"));
        }

        let descriptor = self
            .catalog
            .remove(id)
            .await?
            .ok_or_else(|| FileHostError::not_found(id))?;

        match self.store.delete(&descriptor.stored_name).await {
            Ok(()) => {
                tracing::info!(file_id = id, blob = %descriptor.stored_name, "file deleted")
            }
            Err(e) => tracing::warn!(
                file_id = id,
                blob = %descriptor.stored_name,
                error = %e,
                "catalog entry removed but blob removal failed"
            ),
        }
        Ok(())
    }

    /// Look up a file and open its blob
    pub async fn open(&self, id: &str) -> FileHostResult<(FileDescriptor, GetResult)> {
        let descriptor = self
            .catalog
            .list_all()
            .await?
            .into_iter()
            .find(|d| d.id.as_str() == id)
            .ok_or_else(|| FileHostError::not_found(id))?;
        let blob = self.store.get(&descriptor.stored_name).await?;
        Ok((descriptor, blob))
    }

    fn view(&self, descriptor: FileDescriptor) -> FileView {
        FileView {
            url: self.store.url_for(&descriptor.stored_name),
            id: descriptor.id,
            name: descriptor.original_name,
            file_type: descriptor.file_type,
            size: descriptor.size,
            uploaded_at: descriptor.uploaded_at,
        }
    }
}
