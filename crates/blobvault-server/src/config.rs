use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_STORAGE: &str = "storage";
pub const DEFAULT_BLOB_DB: &str = "blobs.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage_root: PathBuf,
    pub db_file: PathBuf,
    pub max_upload_size: usize,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            storage_root: PathBuf::from(DEFAULT_STORAGE),
            db_file: PathBuf::from(DEFAULT_BLOB_DB),
            max_upload_size: 64 * 1024 * 1024,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// URI clients should use to reach this server.
    pub fn base_uri(&self) -> String {
        let host = if self.bind_addr.ip().is_unspecified() {
            "127.0.0.1".to_string()
        } else {
            self.bind_addr.ip().to_string()
        };
        format!("http://{host}:{}", self.bind_addr.port())
    }
}

/// Token table for [`crate::auth::StaticTokenResolver`]: token -> user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: BTreeMap<String, String>,
}
