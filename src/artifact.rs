// src/artifact.rs

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::extract::Table;

/// File name of the JSON artifact, overwritten on every successful upload.
pub const ARTIFACT_NAME: &str = "tables_only.json";

/// Serialize the extracted tables as pretty-printed JSON into
/// `dir/tables_only.json`. Written to a temp file first and renamed into
/// place, so a concurrent download never sees a torn artifact.
pub fn write_artifact(dir: &Path, tables: &[Table]) -> Result<()> {
    let final_path = dir.join(ARTIFACT_NAME);
    let tmp_path = dir.join(format!(".{}.tmp", ARTIFACT_NAME));

    let json = serde_json::to_string_pretty(tables).context("serializing tables to JSON")?;
    fs::write(&tmp_path, json)
        .with_context(|| format!("writing temporary artifact `{}`", tmp_path.display()))?;
    fs::rename(&tmp_path, &final_path).with_context(|| {
        format!(
            "renaming `{}` to `{}`",
            tmp_path.display(),
            final_path.display()
        )
    })?;

    info!(
        tables = tables.len(),
        path = %final_path.display(),
        "wrote artifact"
    );
    Ok(())
}

/// Read back the current artifact bytes, or `None` if no upload has produced
/// one yet.
pub fn load_artifact(dir: &Path) -> Result<Option<Vec<u8>>> {
    let path = dir.join(ARTIFACT_NAME);
    if !path.exists() {
        return Ok(None);
    }
    let bytes =
        fs::read(&path).with_context(|| format!("reading artifact `{}`", path.display()))?;
    Ok(Some(bytes))
}
