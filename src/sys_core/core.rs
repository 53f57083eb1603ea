//! Service configuration: read once at startup, passed into every handler.

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

/// Extensions an upload may carry. Everything else is rejected before a
/// byte reaches the upload directory.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "pdf", "txt"];

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub upload_dir: PathBuf,
    pub public_dir: PathBuf,
    pub allowed_exts: HashSet<String>,
}

impl ServiceConfig {
    pub fn new(port: u16, upload_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        ServiceConfig {
            port,
            upload_dir: upload_dir.into(),
            public_dir: public_dir.into(),
            allowed_exts: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Build a config from `PORT`, `UPLOAD_DIR` and `PUBLIC_DIR`, falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let public_dir = env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string());
        ServiceConfig::new(port, upload_dir, public_dir)
    }

    /// `ext` is expected lower-cased without the leading dot.
    pub fn is_allowed(&self, ext: &str) -> bool {
        self.allowed_exts.contains(ext)
    }
}
