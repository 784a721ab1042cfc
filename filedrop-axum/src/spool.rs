//! Multipart batch spooling.
//!
//! Each file part is streamed to its own temp file while its bytes are counted, so
//! the upload coordinator sees every file's size before anything is stored. Bytes
//! past `max_file_size` are counted but not written: such a file fails the batch
//! anyway. Spool files are deleted when the [`SpooledBatch`] is dropped.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use filedrop_blob::{FileHostError, FileHostResult, IncomingFile};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Form field names that carry files
const FILE_FIELDS: [&str; 2] = ["files", "files[]"];

#[derive(Debug)]
enum SpoolEntry {
    Spooled { name: String, path: PathBuf, size: u64 },
    Failed { name: String, reason: String },
}

/// All file parts of one upload request, spooled to disk
#[derive(Debug, Default)]
pub struct SpooledBatch {
    entries: Vec<SpoolEntry>,
}

impl SpooledBatch {
    /// Read every file part of `multipart` into `spool_dir`.
    ///
    /// A part whose transfer breaks off is recorded as failed and ends the read,
    /// since nothing after it can be trusted.
    pub async fn read(
        multipart: &mut Multipart,
        spool_dir: &Path,
        max_file_size: u64,
    ) -> FileHostResult<Self> {
        fs::create_dir_all(spool_dir).await?;
        let mut batch = Self::default();

        loop {
            let mut field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "multipart stream ended abnormally");
                    break;
                }
            };

            let field_name = field.name().unwrap_or_default().to_string();
            // Browsers send an empty filename for a file input left blank.
            let Some(name) = field
                .file_name()
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string)
            else {
                continue;
            };
            if !FILE_FIELDS.contains(&field_name.as_str()) {
                tracing::debug!(field = %field_name, "ignoring file part outside the files field");
                continue;
            }

            let path = spool_dir.join(format!("upload-{}", uuid::Uuid::new_v4().simple()));
            let mut file = fs::File::create(&path).await?;
            // Registered before writing so the drop cleanup sees it whatever happens.
            batch.entries.push(SpoolEntry::Spooled {
                name: name.clone(),
                path: path.clone(),
                size: 0,
            });

            let mut size = 0u64;
            let outcome: Result<(), String> = async {
                while let Some(chunk) = field.chunk().await.map_err(|e| e.to_string())? {
                    let len = chunk.len() as u64;
                    if size + len <= max_file_size {
                        file.write_all(&chunk).await.map_err(|e| e.to_string())?;
                    }
                    size += len;
                }
                file.flush().await.map_err(|e| e.to_string())
            }
            .await;

            match outcome {
                Ok(()) => {
                    if let Some(SpoolEntry::Spooled { size: recorded, .. }) =
                        batch.entries.last_mut()
                    {
                        *recorded = size;
                    }
                }
                Err(reason) => {
                    drop(file);
                    let _ = fs::remove_file(&path).await;
                    batch.entries.pop();
                    batch.entries.push(SpoolEntry::Failed { name, reason });
                    break;
                }
            }
        }

        Ok(batch)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open the spooled files as an upload batch, in submission order
    pub async fn incoming(&self) -> Vec<IncomingFile> {
        let mut files = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            files.push(match entry {
                SpoolEntry::Spooled { name, path, size } => match fs::File::open(path).await {
                    Ok(file) => IncomingFile::received(
                        name.clone(),
                        *size,
                        Box::pin(ReaderStream::new(file)),
                    ),
                    Err(e) => IncomingFile::failed(name.clone(), e.to_string()),
                },
                SpoolEntry::Failed { name, reason } => {
                    IncomingFile::failed(name.clone(), reason.clone())
                }
            });
        }
        files
    }

    /// Reject requests that carried no file parts at all
    pub fn require_files(self) -> FileHostResult<Self> {
        if self.is_empty() {
            return Err(FileHostError::validation("No files uploaded"));
        }
        Ok(self)
    }
}

impl Drop for SpooledBatch {
    fn drop(&mut self) {
        for entry in &self.entries {
            if let SpoolEntry::Spooled { path, .. } = entry {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}
