// src/store/document.rs

use serde::{Deserialize, Serialize};

use crate::extract::Record;

/// One stored row: the extracted cells plus the derived identity fields the
/// record store attaches. Serializes flat, so the JSON document reads as the
/// row itself with `_key`/`_source_file`/`_row_index` alongside the cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_source_file")]
    pub source_file: String,
    #[serde(rename = "_row_index")]
    pub row_index: usize,
    #[serde(flatten)]
    pub cells: Record,
}

impl StoredRecord {
    /// Build the document for one row of one extracted table.
    /// `table_pos` is 1-based (matching the collection name); `row_index`
    /// is 0-based.
    pub fn new(source_file: &str, table_pos: usize, row_index: usize, cells: Record) -> Self {
        Self {
            key: derive_key(source_file, table_pos, row_index),
            source_file: source_file.to_string(),
            row_index,
            cells,
        }
    }
}

/// Collection name for the table at 0-based position `i`: `table_{i+1}`.
pub fn collection_name(table_index: usize) -> String {
    format!("table_{}", table_index + 1)
}

/// Deterministic record key: `<stem>_<table pos 1-based>_<row index 0-based>`
/// where the stem strips one trailing `.md` from the source file name.
pub fn derive_key(source_file: &str, table_pos: usize, row_index: usize) -> String {
    let stem = source_file.strip_suffix(".md").unwrap_or(source_file);
    format!("{}_{}_{}", stem, table_pos, row_index)
}
