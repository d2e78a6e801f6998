use std::sync::Arc;

use blobvault_repo::BlobRepository;
use blobvault_store::FsContentStore;
use tokio::net::TcpListener;

use crate::auth::StaticTokenResolver;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// BlobVault HTTP server.
pub struct BlobVaultServer {
    config: ServerConfig,
}

impl BlobVaultServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the content store and blob database, and build the token table.
    pub fn state(&self) -> ServerResult<AppState> {
        let store = FsContentStore::open(&self.config.storage_root)?;
        let repo = BlobRepository::open(&self.config.db_file, store)?;
        let tokens = StaticTokenResolver::from_table(&self.config.auth.tokens)?;
        if tokens.is_empty() {
            tracing::warn!("no auth tokens configured; only anonymous reads will succeed");
        }
        Ok(AppState::new(repo, Arc::new(tokens)).with_upload_limit(self.config.max_upload_size))
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        Ok(build_router(self.state()?))
    }

    /// Start serving requests until interrupted.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            storage = %self.config.storage_root.display(),
            db = %self.config.db_file.display(),
            "BlobVault server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
