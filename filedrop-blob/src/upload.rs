use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;

use crate::{
    classify::{extension_of, safe_extension},
    BlobStore, ByteStream, Catalog, FileDescriptor, FileHostConfig, FileHostError,
    FileHostResult, IdGenerator, IncomingFile, ReceiptStatus, TypeTable, UploadLink,
};

/// Runs one upload batch: validate, classify, store, register, link.
///
/// Batch policy:
/// - files whose transfer failed are dropped from the result, not reported
/// - one oversize file rejects the whole batch before anything is written
/// - a storage failure aborts the rest of the batch; files already stored stay
/// - a catalog failure leaves the blob on disk unregistered (an orphan) and is logged
pub struct UploadCoordinator {
    store: Arc<dyn BlobStore>,
    catalog: Arc<dyn Catalog>,
    ids: Arc<dyn IdGenerator>,
    types: TypeTable,
    max_file_size_bytes: u64,
}

impl UploadCoordinator {
    pub fn new(
        store: Arc<dyn BlobStore>,
        catalog: Arc<dyn Catalog>,
        ids: Arc<dyn IdGenerator>,
        config: &FileHostConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            ids,
            types: config.type_table.clone(),
            max_file_size_bytes: config.max_file_size_bytes,
        }
    }

    /// Store a batch, returning one link per stored file in submission order
    pub async fn upload(&self, batch: Vec<IncomingFile>) -> FileHostResult<Vec<UploadLink>> {
        if batch.is_empty() {
            return Err(FileHostError::validation("No files uploaded"));
        }

        let received: Vec<IncomingFile> = batch
            .into_iter()
            .filter(|file| match &file.status {
                ReceiptStatus::Received => true,
                ReceiptStatus::Failed { reason } => {
                    tracing::warn!(
                        file = %file.name,
                        reason = %reason,
                        "skipping file with failed transfer"
                    );
                    false
                }
            })
            .collect();

        if let Some(file) = received
            .iter()
            .find(|f| f.declared_size > self.max_file_size_bytes)
        {
            tracing::info!(
                file = %file.name,
                size = file.declared_size,
                max = self.max_file_size_bytes,
                "rejecting batch with oversize file"
            );
            return Err(FileHostError::file_too_large(
                file.name.clone(),
                file.declared_size,
                self.max_file_size_bytes,
            ));
        }

        let mut links = Vec::with_capacity(received.len());
        for file in received {
            links.push(self.store_one(file).await?);
        }
        Ok(links)
    }

    async fn store_one(&self, file: IncomingFile) -> FileHostResult<UploadLink> {
        let IncomingFile { name, body, .. } = file;

        let file_type = self
            .types
            .classify(extension_of(&name).as_deref().unwrap_or_default());
        let id = self.ids.generate()?;
        let stored_name = match safe_extension(&name) {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        };

        let body = cap_stream(body, self.max_file_size_bytes);
        let put = self
            .store
            .put(&stored_name, body)
            .await
            .map_err(|e| match e {
                FileHostError::StorageWrite { source, .. } => {
                    FileHostError::storage_write(name.clone(), source)
                }
                other => FileHostError::storage_write(
                    name.clone(),
                    std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
                ),
            })?;

        let descriptor = FileDescriptor {
            id,
            original_name: name.clone(),
            stored_name,
            file_type,
            size: put.size_bytes,
            uploaded_at: Utc::now(),
        };

        if let Err(e) = self.catalog.append(descriptor.clone()).await {
            tracing::error!(
                file_id = %descriptor.id,
                blob = %descriptor.stored_name,
                error = %e,
                "catalog append failed, blob left orphaned"
            );
            return Err(e);
        }

        tracing::info!(
            file_id = %descriptor.id,
            file = %descriptor.original_name,
            file_type = %descriptor.file_type,
            size = descriptor.size,
            "file stored"
        );

        Ok(UploadLink {
            name,
            url: self.store.url_for(&descriptor.stored_name),
            file_type,
        })
    }
}

/// Fail the stream once more than `max` bytes have passed through
fn cap_stream(stream: ByteStream, max: u64) -> ByteStream {
    let mut seen = 0u64;
    Box::pin(stream.map(move |chunk| {
        let chunk = chunk?;
        seen += chunk.len() as u64;
        if seen > max {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("payload exceeds {} bytes", max),
            ));
        }
        Ok(chunk)
    }))
}
