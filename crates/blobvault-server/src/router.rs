use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use blobvault_repo::BlobRepository;
use blobvault_store::FsContentStore;
use tower_http::trace::TraceLayer;

use crate::auth::TokenResolver;
use crate::handler;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<BlobRepository<FsContentStore>>,
    pub tokens: Arc<dyn TokenResolver>,
    pub max_upload_size: usize,
}

impl AppState {
    pub fn new(repo: BlobRepository<FsContentStore>, tokens: Arc<dyn TokenResolver>) -> Self {
        Self {
            repo: Arc::new(repo),
            tokens,
            max_upload_size: 64 * 1024 * 1024,
        }
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.max_upload_size = bytes;
        self
    }
}

/// Build the axum router with all BlobVault endpoints under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    let limit = state.max_upload_size;
    let api = Router::new()
        .route("/status", get(handler::status))
        .route("/blob", post(handler::create_blob))
        .route("/blobs", get(handler::list_blobs))
        .route(
            "/blob/:id",
            get(handler::download_blob)
                .put(handler::update_blob)
                .delete(handler::delete_blob),
        )
        .route("/blob/:id/hash", get(handler::blob_hash))
        .route("/blob/:id/visibility", put(handler::set_visibility))
        .route(
            "/blob/:id/acl",
            get(handler::list_acl)
                .post(handler::add_acl)
                .put(handler::replace_acl),
        )
        .route("/blob/:id/acl/:username", delete(handler::remove_acl));

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
