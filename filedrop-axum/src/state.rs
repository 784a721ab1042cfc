use std::path::PathBuf;
use std::sync::Arc;

use filedrop_blob::FileRegistry;

/// Shared handler state
#[derive(Clone)]
pub struct FileDropState {
    pub registry: Arc<FileRegistry>,
    pub spool_dir: Arc<PathBuf>,
}

impl FileDropState {
    pub fn new(registry: FileRegistry, spool_dir: PathBuf) -> Self {
        Self {
            registry: Arc::new(registry),
            spool_dir: Arc::new(spool_dir),
        }
    }
}
