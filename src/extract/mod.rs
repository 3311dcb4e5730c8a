// src/extract/mod.rs

pub mod scan;
pub mod types;
pub mod validate;

pub use scan::{extract_tables, TableScanner};
pub use types::{Record, Table};
pub use validate::validate_markdown;
