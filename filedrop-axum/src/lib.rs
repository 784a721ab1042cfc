//! filedrop-axum: HTTP boundary for FileDrop.
//!
//! Exposes the file registry over Axum: multipart uploads under `/api/upload`,
//! listing and deletion under `/api/files`, and the stored blobs themselves under
//! the configured serve prefix.

pub mod app;
pub mod config;
pub mod routes;
pub mod spool;
pub mod state;
mod error;
pub use error::FileDropAxumError;
pub use state::FileDropState;

pub use app::{build, router, FileDropApp};
pub use config::ServerConfig;
