// src/serve/upload.rs

use std::fs;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::artifact;
use crate::extract::{extract_tables, validate_markdown, Table};
use crate::serve::AppState;

/// The user-facing failure classes of the upload pipeline. Everything is
/// recovered at the handler and rendered on the upload page; nothing here
/// crashes the service.
#[derive(Debug)]
pub enum UploadError {
    NoFile,
    BadExtension,
    NoTables,
    Store(String),
    Other(String),
}

impl UploadError {
    pub fn message(&self) -> String {
        match self {
            Self::NoFile => "No file uploaded".to_string(),
            Self::BadExtension => "Please upload a valid .md file".to_string(),
            Self::NoTables => "No tables found in the Markdown file".to_string(),
            Self::Store(detail) => format!("Failed to store records: {detail}"),
            Self::Other(detail) => format!("Error processing file: {detail}"),
        }
    }
}

/// Strip any path components from a client-supplied file name and reduce it
/// to a safe character set.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The synchronous half of the pipeline: save the raw upload, validate it as
/// Markdown, extract tables, write the JSON artifact, and upsert the records.
/// Runs on the blocking pool; the caller has already checked the part name
/// and `.md` extension.
pub fn ingest(state: &Arc<AppState>, filename: &str, bytes: &[u8]) -> Result<Vec<Table>, UploadError> {
    let saved_path = state.config.upload_dir.join(filename);
    let tables = (|| -> anyhow::Result<Vec<Table>> {
        fs::write(&saved_path, bytes)
            .with_context(|| format!("saving upload `{}`", saved_path.display()))?;
        let text = validate_markdown(bytes)?;
        Ok(extract_tables(text))
    })()
    .map_err(|e| UploadError::Other(format!("{e:#}")))?;

    if tables.is_empty() {
        warn!(filename, "upload contained no tables");
        return Err(UploadError::NoTables);
    }

    artifact::write_artifact(&state.config.upload_dir, &tables)
        .map_err(|e| UploadError::Other(format!("{e:#}")))?;

    let mut store = state.store.lock().expect("record store lock poisoned");
    let records = store
        .store_tables(filename, &tables)
        .map_err(|e| UploadError::Store(format!("{e:#}")))?;

    info!(filename, tables = tables.len(), records, "upload ingested");
    Ok(tables)
}
