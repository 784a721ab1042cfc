use thiserror::Error;

/// Result type for registry operations
pub type FileHostResult<T> = Result<T, FileHostError>;

/// Errors that can occur while uploading, listing, or deleting files
#[derive(Error, Debug)]
pub enum FileHostError {
    /// Malformed request: empty batch, missing file id on delete
    #[error("{message}")]
    Validation { message: String },

    /// A file in the batch exceeds the configured maximum; the whole batch is rejected
    #[error("File size too large: {name}")]
    FileTooLarge { name: String, size: u64, max: u64 },

    /// Blob bytes could not be written
    #[error("Failed to save file: {name}")]
    StorageWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Catalog could not be durably persisted
    #[error("Failed to update file catalog: {reason}")]
    CatalogWrite { reason: String },

    #[error("File not found")]
    NotFound { id: String },

    /// The OS randomness source failed. Fatal configuration problem, never retried.
    #[error("Randomness source unavailable: {reason}")]
    Entropy { reason: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl FileHostError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a file too large error
    pub fn file_too_large<S: Into<String>>(name: S, size: u64, max: u64) -> Self {
        Self::FileTooLarge {
            name: name.into(),
            size,
            max,
        }
    }

    /// Create a storage write error for the named file
    pub fn storage_write<S: Into<String>>(name: S, source: std::io::Error) -> Self {
        Self::StorageWrite {
            name: name.into(),
            source,
        }
    }

    /// Create a catalog write error
    pub fn catalog_write<S: Into<String>>(reason: S) -> Self {
        Self::CatalogWrite {
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Short machine-readable kind, used in logs and transport mapping
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::StorageWrite { .. } => "storage_write",
            Self::CatalogWrite { .. } => "catalog_write",
            Self::NotFound { .. } => "not_found",
            Self::Entropy { .. } => "entropy",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }
}
