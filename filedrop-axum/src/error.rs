use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filedrop_blob::FileHostError;
use serde_json::json;

#[derive(Debug)]
pub struct FileDropAxumError(pub FileHostError);

impl From<FileHostError> for FileDropAxumError {
    fn from(e: FileHostError) -> Self {
        Self(e)
    }
}

impl FileDropAxumError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            FileHostError::Validation { .. } => StatusCode::BAD_REQUEST,
            FileHostError::NotFound { .. } => StatusCode::NOT_FOUND,
            FileHostError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients. Catalog and I/O internals stay in the logs.
    pub fn client_message(&self) -> String {
        match &self.0 {
            FileHostError::CatalogWrite { .. }
            | FileHostError::Entropy { .. }
            | FileHostError::Io { .. }
            | FileHostError::Serialization { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for FileDropAxumError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = ?self.0, "request failed");
        }

        let body = json!({
            "success": false,
            "message": self.client_message(),
        });
        (status, Json(body)).into_response()
    }
}
