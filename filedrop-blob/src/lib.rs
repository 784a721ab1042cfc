//! # filedrop-blob: file registry and storage lifecycle
//!
//! `filedrop-blob` is the core of FileDrop, a minimal file-hosting service. It accepts
//! upload batches, classifies and stores each file, keeps a durable catalog of every
//! stored file, and removes files again by id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filedrop_blob::prelude::*;
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> FileHostResult<()> {
//! let registry = FileRegistry::open(FileHostConfig::default()).await?;
//!
//! let body = futures_util::stream::once(async { Ok::<_, std::io::Error>(Bytes::from_static(b"hello")) });
//! let links = registry
//!     .upload(vec![IncomingFile::received("hello.txt", 5, Box::pin(body))])
//!     .await?;
//!
//! let listing = registry.list().await?;
//! println!("{} -> {} ({})", links[0].name, links[0].url, listing.stats.total_size);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                FileRegistry                 │  ← what transports embed
//! ├──────────────────────┬──────────────────────┤
//! │  UploadCoordinator   │     QueryService     │  ← batch upload / list + delete
//! ├──────────────────────┴──────────────────────┤
//! │  TypeTable  IdGenerator  BlobStore  Catalog │  ← leaves
//! └─────────────────────────────────────────────┘
//! ```
//!
//! A descriptor exists in the [`Catalog`] exactly when its blob exists in the
//! [`BlobStore`]: it is appended only after the blob write succeeded and removed
//! before the blob is deleted.

pub mod catalog;
mod classify;
mod config;
mod error;
mod format;
pub mod fs_store;
mod ids;
mod query;
mod registry;
pub mod store;
mod types;
mod upload;

pub use catalog::{Catalog, JsonFileCatalog, MemoryCatalog};
pub use classify::{classify, extension_of, safe_extension, TypeTable};
pub use config::FileHostConfig;
pub use error::{FileHostError, FileHostResult};
pub use format::format_size;
pub use fs_store::FsBlobStore;
pub use ids::{DefaultIdGenerator, IdGenerator};
pub use query::QueryService;
pub use registry::FileRegistry;
pub use store::{BlobStore, GetResult, PutResult};
pub use types::{
    ByteStream, FileDescriptor, FileId, FileListing, FileStats, FileType, FileView,
    IncomingFile, ReceiptStatus, UploadLink,
};
pub use upload::UploadCoordinator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobStore, ByteStream, Catalog, FileHostConfig, FileHostError, FileHostResult,
        FileRegistry, FileType, IncomingFile, UploadLink,
    };
}
