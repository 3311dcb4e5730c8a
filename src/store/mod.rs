// src/store/mod.rs

pub mod document;

pub use document::{collection_name, derive_key, StoredRecord};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

use crate::extract::Table;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_file TEXT NOT NULL,
    table_count INTEGER NOT NULL,
    record_count INTEGER NOT NULL,
    uploaded_at_micros INTEGER NOT NULL
);
";

/// Embedded record store: one SQLite table per extracted Markdown table,
/// each row held as a self-describing JSON document keyed by its derived
/// identifier, plus an append-only log of ingested uploads.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) the database file and apply the base schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating `{}`", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening record store `{}`", path.display()))?;
        let store = Self { conn };
        store.apply_pragmas()?;
        store
            .conn
            .execute_batch(SCHEMA_SQL)
            .context("initializing record store schema")?;
        Ok(store)
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory store")?;
        let store = Self { conn };
        store.conn.execute_batch(SCHEMA_SQL)?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .context("applying store pragmas")?;
        Ok(())
    }

    /// Persist every table extracted from one upload. Each table lands in
    /// its own `table_{i+1}` collection; rows upsert on their derived key,
    /// so re-uploading the same file overwrites rather than conflicting.
    /// One transaction per call; the upload log entry commits with the rows.
    /// Returns the number of records written.
    pub fn store_tables(&mut self, source_file: &str, tables: &[Table]) -> Result<usize> {
        let tx = self.conn.transaction().context("starting store transaction")?;
        let mut record_count = 0usize;

        for (i, table) in tables.iter().enumerate() {
            let collection = collection_name(i);
            // Collection names come from table positions, never user input,
            // so the generated DDL stays confined to `table_{n}`.
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {collection} (
                    key TEXT PRIMARY KEY,
                    row_index INTEGER NOT NULL,
                    doc TEXT NOT NULL
                );"
            ))
            .with_context(|| format!("creating collection `{collection}`"))?;

            let sql = format!(
                "INSERT OR REPLACE INTO {collection} (key, row_index, doc) VALUES (?1, ?2, ?3)"
            );
            let mut stmt = tx
                .prepare(&sql)
                .with_context(|| format!("preparing upsert for `{collection}`"))?;

            for (row_idx, cells) in table.iter().enumerate() {
                let record = StoredRecord::new(source_file, i + 1, row_idx, cells.clone());
                let doc = serde_json::to_string(&record)
                    .with_context(|| format!("serializing record `{}`", record.key))?;
                stmt.execute(params![record.key, row_idx as i64, doc])
                    .with_context(|| format!("upserting record `{}`", record.key))?;
                record_count += 1;
            }
            debug!(collection = %collection, rows = table.len(), "stored collection");
        }

        tx.execute(
            "INSERT INTO uploads (source_file, table_count, record_count, uploaded_at_micros)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                source_file,
                tables.len() as i64,
                record_count as i64,
                Utc::now().timestamp_micros()
            ],
        )
        .context("recording upload")?;

        tx.commit().context("committing store transaction")?;
        info!(
            source_file,
            tables = tables.len(),
            records = record_count,
            "stored upload"
        );
        Ok(record_count)
    }

    /// Load every document in one collection, ordered by row index.
    /// `Ok(empty)` when the collection has never been created.
    pub fn load_collection(&self, table_index: usize) -> Result<Vec<StoredRecord>> {
        let collection = collection_name(table_index);
        let exists: bool = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                params![collection],
                |row| row.get(0),
            )
            .context("checking collection existence")?;
        if !exists {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT doc FROM {collection} ORDER BY row_index"
            ))
            .with_context(|| format!("preparing read of `{collection}`"))?;
        let docs = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .with_context(|| format!("reading `{collection}`"))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .with_context(|| format!("draining rows of `{collection}`"))?;

        docs.iter()
            .map(|doc| serde_json::from_str(doc).context("deserializing stored record"))
            .collect()
    }

    /// Number of ingestions logged so far.
    pub fn upload_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM uploads", [], |row| row.get(0))
            .context("counting uploads")?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_tables;

    #[test]
    fn stores_one_collection_per_table() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        let tables = extract_tables("| A | B |\n| 1 | 2 |\n\n| X |\n| 9 |\n| 8 |\n");
        let written = store.store_tables("doc.md", &tables)?;
        assert_eq!(written, 3);

        let first = store.load_collection(0)?;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].key, "doc_1_0");
        assert_eq!(first[0].cells["A"], "1");

        let second = store.load_collection(1)?;
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].key, "doc_2_1");
        assert_eq!(second[1].row_index, 1);
        Ok(())
    }

    #[test]
    fn reupload_upserts_instead_of_duplicating() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        store.store_tables("doc.md", &extract_tables("| A |\n| old |\n"))?;
        store.store_tables("doc.md", &extract_tables("| A |\n| new |\n"))?;

        let rows = store.load_collection(0)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells["A"], "new");
        // The upload log stays append-only.
        assert_eq!(store.upload_count()?, 2);
        Ok(())
    }

    #[test]
    fn missing_collection_reads_empty() -> Result<()> {
        let store = RecordStore::open_in_memory()?;
        assert!(store.load_collection(6)?.is_empty());
        Ok(())
    }

    #[test]
    fn stored_documents_carry_derived_fields() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        store.store_tables("report.md", &extract_tables("| Name |\n| alpha |\n"))?;

        let rows = store.load_collection(0)?;
        assert_eq!(rows[0].source_file, "report.md");
        assert_eq!(rows[0].row_index, 0);
        assert_eq!(rows[0].key, "report_1_0");
        Ok(())
    }

    #[test]
    fn on_disk_store_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("store.db");
        {
            let mut store = RecordStore::open(&db_path)?;
            store.store_tables("doc.md", &extract_tables("| A |\n| 1 |\n"))?;
        }
        let store = RecordStore::open(&db_path)?;
        assert_eq!(store.load_collection(0)?.len(), 1);
        assert_eq!(store.upload_count()?, 1);
        Ok(())
    }
}
