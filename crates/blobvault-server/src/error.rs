use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blobvault_repo::{ErrorKind, RepoError};
use blobvault_store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("blob not found: {0}")]
    UnknownBlob(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload rejected: {0}")]
    Upload(#[from] axum::extract::multipart::MultipartError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownBlob(_) => StatusCode::NOT_FOUND,
            Self::AuthFailed(_) | Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upload(err) => err.status(),
            Self::Repo(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::AlreadyExists => StatusCode::CONFLICT,
                ErrorKind::Unauthorized => match err {
                    RepoError::Unauthorized { user: None, .. } => StatusCode::UNAUTHORIZED,
                    _ => StatusCode::FORBIDDEN,
                },
                ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
                ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
