use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Unique, unguessable identifier for an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic type of a file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
    Audio,
    Document,
}

impl FileType {
    /// All types, in classification order
    pub const ALL: [FileType; 4] = [
        FileType::Image,
        FileType::Video,
        FileType::Audio,
        FileType::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Video => "video",
            FileType::Audio => "audio",
            FileType::Document => "document",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The catalog's unit of record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: FileId,
    /// Client-supplied name, display only
    pub original_name: String,
    /// On-disk blob name: id plus sanitised extension
    pub stored_name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Bytes actually written to the blob
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Transport-level outcome of receiving one file of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    Received,
    Failed { reason: String },
}

/// One file of an upload batch as handed over by the transport layer
pub struct IncomingFile {
    pub name: String,
    pub declared_size: u64,
    pub status: ReceiptStatus,
    pub body: ByteStream,
}

impl IncomingFile {
    /// A fully received file
    pub fn received<S: Into<String>>(name: S, declared_size: u64, body: ByteStream) -> Self {
        Self {
            name: name.into(),
            declared_size,
            status: ReceiptStatus::Received,
            body,
        }
    }

    /// A file whose transfer broke off; it is skipped by the upload coordinator
    pub fn failed<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        Self {
            name: name.into(),
            declared_size: 0,
            status: ReceiptStatus::Failed {
                reason: reason.into(),
            },
            body: Box::pin(futures_util::stream::empty::<Result<Bytes, std::io::Error>>()),
        }
    }

    pub fn is_received(&self) -> bool {
        matches!(self.status, ReceiptStatus::Received)
    }
}

impl std::fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingFile")
            .field("name", &self.name)
            .field("declared_size", &self.declared_size)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Shareable link returned for each stored file of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLink {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
}

/// Public view of a descriptor, as returned by listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileView {
    pub id: FileId,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub size: u64,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Aggregate statistics over the whole catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub total_files: usize,
    pub total_size: String,
}

/// Result of listing the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListing {
    pub files: Vec<FileView>,
    pub stats: FileStats,
}
