// src/config.rs

use std::env;
use std::path::PathBuf;

/// Runtime configuration, resolved once at startup and passed explicitly
/// into the collaborators that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding saved uploads and the JSON artifact.
    pub upload_dir: PathBuf,
    /// SQLite database file for the record store.
    pub db_path: PathBuf,
    /// HTTP listen port.
    pub port: u16,
    /// Upper bound on an uploaded request body, in bytes.
    pub max_upload_bytes: u64,
}

impl AppConfig {
    /// Resolve from the environment: `MDTABLES_UPLOAD_DIR`, `MDTABLES_DB`,
    /// `MDTABLES_MAX_UPLOAD_BYTES`, and `PORT`, each with a default.
    pub fn from_env() -> Self {
        let upload_dir = env::var("MDTABLES_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let db_path = env::var("MDTABLES_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("mdtables.db"));
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);
        let max_upload_bytes: u64 = env::var("MDTABLES_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5 * 1024 * 1024);

        Self {
            upload_dir,
            db_path,
            port,
            max_upload_bytes,
        }
    }

    /// Path of the JSON artifact inside the upload directory.
    pub fn artifact_path(&self) -> PathBuf {
        self.upload_dir.join(crate::artifact::ARTIFACT_NAME)
    }
}
