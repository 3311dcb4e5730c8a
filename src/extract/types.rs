// src/extract/types.rs

use indexmap::IndexMap;

/// One parsed row: header name → trimmed cell text, in header order.
/// Duplicate header names collapse map-style: first position wins, last
/// value wins.
pub type Record = IndexMap<String, String>;

/// One table: every record carries exactly the key set produced from the
/// table's header row.
pub type Table = Vec<Record>;
