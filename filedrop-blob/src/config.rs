use std::path::PathBuf;

use crate::TypeTable;

/// Configuration for the file registry
#[derive(Debug, Clone)]
pub struct FileHostConfig {
    /// Directory holding one blob per stored upload
    pub upload_root: PathBuf,

    /// Persisted catalog file
    pub catalog_path: PathBuf,

    /// Largest single file accepted in a batch
    pub max_file_size_bytes: u64,

    /// Scheme and authority the blobs are served from, e.g. `https://files.example.com`
    pub public_base_url: String,

    /// Path segment(s) under which the upload root is served
    pub serve_prefix: String,

    /// Extension lists per file type
    pub type_table: TypeTable,
}

impl Default for FileHostConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("uploads"),
            catalog_path: PathBuf::from("files.json"),
            max_file_size_bytes: 20 * 1024 * 1024, // 20MB
            public_base_url: "http://127.0.0.1:3030".to_string(),
            serve_prefix: "uploads".to_string(),
            type_table: TypeTable::default(),
        }
    }
}

impl FileHostConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blob root directory
    pub fn with_upload_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.upload_root = root.into();
        self
    }

    /// Set the catalog file
    pub fn with_catalog_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.catalog_path = path.into();
        self
    }

    /// Set max file size
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    /// Set the public base url
    pub fn with_public_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Set the serving prefix
    pub fn with_serve_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.serve_prefix = prefix.into();
        self
    }

    /// Set the extension table
    pub fn with_type_table(mut self, table: TypeTable) -> Self {
        self.type_table = table;
        self
    }
}
