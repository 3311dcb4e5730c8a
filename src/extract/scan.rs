// src/extract/scan.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::extract::types::{Record, Table};

/// Decorative alignment rows like `|---|:--:|`: pipes enclosing only
/// dashes, colons, pipes, and whitespace. Skipped wherever they appear and
/// never close an open table.
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|[-:|\s]+\|\s*$").expect("separator pattern should compile"));

fn is_separator_line(line: &str) -> bool {
    SEPARATOR_RE.is_match(line.trim())
}

/// Split a content line on pipes, trimming each segment and dropping the
/// empties that leading/trailing pipes produce.
fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Zip one data row against the headers. Overlong rows are truncated to the
/// header length; short rows are right-padded with empty strings, so every
/// record ends up with exactly the header's key set.
fn build_record(headers: &[String], mut cells: Vec<String>) -> Record {
    cells.truncate(headers.len());
    cells.resize(headers.len(), String::new());
    headers.iter().cloned().zip(cells).collect()
}

/// Single-pass scanner that folds lines into pipe-delimited tables.
///
/// The first content line arms a header; subsequent content lines become its
/// records. A blank or pipe-free line closes a table once it holds at least
/// one record. A header that has not yet accumulated a record survives such
/// lines and keeps collecting — see the pinning tests below before changing
/// that.
#[derive(Debug, Default)]
pub struct TableScanner {
    headers: Option<Vec<String>>,
    rows: Vec<Record>,
    tables: Vec<Table>,
}

impl TableScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Classification order matters: separator rows are
    /// discarded first, then any pipe-bearing line is consumed as header or
    /// data, and only a blank or pipe-free line can close an open table.
    pub fn push_line(&mut self, line: &str) {
        if is_separator_line(line) {
            return;
        }

        if line.contains('|') {
            let cells = split_cells(line);
            if cells.is_empty() {
                // Pipes with nothing between them ("||"): neither data nor
                // a terminator.
                return;
            }
            match self.headers.as_deref() {
                None => {
                    trace!(columns = cells.len(), "table opened");
                    self.headers = Some(cells);
                }
                Some(headers) => self.rows.push(build_record(headers, cells)),
            }
            return;
        }

        // Blank or pipe-free text terminates the current table, but only
        // once it holds data; a bare header stays armed.
        if self.headers.is_some() && !self.rows.is_empty() {
            self.flush();
        }
    }

    fn flush(&mut self) {
        trace!(rows = self.rows.len(), "table closed");
        self.tables.push(std::mem::take(&mut self.rows));
        self.headers = None;
    }

    /// Consume the scanner, flushing a table still open at end of input.
    pub fn finish(mut self) -> Vec<Table> {
        if !self.rows.is_empty() {
            self.flush();
        }
        self.tables
    }
}

/// Scan `text` line by line and return every pipe-delimited table found, in
/// document order. Total over all inputs: malformed rows are reconciled
/// against their header, and text without tables yields an empty list, never
/// an error.
pub fn extract_tables(text: &str) -> Vec<Table> {
    let mut scanner = TableScanner::new();
    for line in text.lines() {
        scanner.push_line(line);
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn basic_table_with_separator() {
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            vec![record(&[("A", "1"), ("B", "2")]), record(&[("A", "3"), ("B", "4")])]
        );
    }

    #[test]
    fn record_keys_follow_header_order() {
        let tables = extract_tables("| Z | M | A |\n| 1 | 2 | 3 |\n");
        let keys: Vec<&String> = tables[0][0].keys().collect();
        assert_eq!(keys, ["Z", "M", "A"]);
    }

    #[test]
    fn no_pipes_means_no_tables() {
        let text = "# Heading\n\nJust prose here.\nAnd more prose.\n";
        assert!(extract_tables(text).is_empty());
    }

    #[test]
    fn empty_input_means_no_tables() {
        assert!(extract_tables("").is_empty());
    }

    #[test]
    fn overlong_rows_are_truncated() {
        let tables = extract_tables("| A | B |\n| 1 | 2 | 3 | 4 |\n");
        assert_eq!(tables[0], vec![record(&[("A", "1"), ("B", "2")])]);
    }

    #[test]
    fn short_rows_are_padded_with_empty_strings() {
        let tables = extract_tables("| A | B | C |\n| 1 |\n");
        assert_eq!(tables[0], vec![record(&[("A", "1"), ("B", ""), ("C", "")])]);
    }

    #[test]
    fn every_record_carries_the_header_key_set() {
        let text = "| A | B | C |\n| 1 | 2 | 3 | 4 |\n| 5 |\n| 6 | 7 | 8 |\n";
        let tables = extract_tables(text);
        for rec in &tables[0] {
            let keys: Vec<&String> = rec.keys().collect();
            assert_eq!(keys, ["A", "B", "C"]);
        }
    }

    #[test]
    fn header_only_block_yields_no_table() {
        let tables = extract_tables("| A | B |\n|---|---|\n\nprose after\n");
        assert!(tables.is_empty());
    }

    #[test]
    fn two_tables_split_by_blank_line() {
        let text = "| A | B |\n| 1 | 2 |\n\n| X | Y |\n| 9 | 8 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0], vec![record(&[("A", "1"), ("B", "2")])]);
        assert_eq!(tables[1], vec![record(&[("X", "9"), ("Y", "8")])]);
    }

    #[test]
    fn prose_line_terminates_like_a_blank_one() {
        let text = "| A | B |\n| 1 | 2 |\nsome prose\n| X | Y |\n| 9 | 8 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1][0], record(&[("X", "9"), ("Y", "8")]));
    }

    #[test]
    fn consecutive_blank_lines_produce_no_empty_tables() {
        let text = "| A |\n| 1 |\n\n\n\n| B |\n| 2 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0], vec![record(&[("A", "1")])]);
        assert_eq!(tables[1], vec![record(&[("B", "2")])]);
    }

    #[test]
    fn table_open_at_end_of_input_is_flushed() {
        let tables = extract_tables("| A | B |\n| 1 | 2 |");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0], vec![record(&[("A", "1"), ("B", "2")])]);
    }

    // Pins the scanner quirk documented in DESIGN.md: adjacent tables with
    // no terminating line in between merge under the first header.
    #[test]
    fn adjacent_tables_merge_without_terminator() {
        let text = "| A | B |\n| 1 | 2 |\n| X | Y |\n| 9 | 8 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            vec![
                record(&[("A", "1"), ("B", "2")]),
                record(&[("A", "X"), ("B", "Y")]),
                record(&[("A", "9"), ("B", "8")]),
            ]
        );
    }

    // Pins the second quirk: a bare header is not cleared by a terminator,
    // so pipe rows after the gap become its records.
    #[test]
    fn header_survives_blank_line_until_rows_arrive() {
        let text = "| A | B |\n\n| 1 | 2 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0], vec![record(&[("A", "1"), ("B", "2")])]);
    }

    #[test]
    fn separator_lines_never_terminate_a_table() {
        let text = "| A |\n|---|\n| 1 |\n|:-:|\n| 2 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables[0], vec![record(&[("A", "1")]), record(&[("A", "2")])]);
    }

    #[test]
    fn separator_before_any_table_is_ignored() {
        let tables = extract_tables("|---|---|\n| A | B |\n| 1 | 2 |\n");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0], vec![record(&[("A", "1"), ("B", "2")])]);
    }

    #[test]
    fn pipes_without_cells_are_a_no_op() {
        // "||" carries pipes but no cells: it must neither add a row nor
        // close the table.
        let text = "| A | B |\n| 1 | 2 |\n||\n| 3 | 4 |\n";
        let tables = extract_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 2);
    }

    #[test]
    fn duplicate_headers_collapse_to_last_value() {
        let tables = extract_tables("| A | A |\n| 1 | 2 |\n");
        assert_eq!(tables[0], vec![record(&[("A", "2")])]);
    }

    #[test]
    fn cells_are_trimmed_and_unpiped_rows_keep_inner_whitespace() {
        let tables = extract_tables("|  A  |  B  |\n|  1 2  |  x  |\n");
        assert_eq!(tables[0], vec![record(&[("A", "1 2"), ("B", "x")])]);
    }

    #[test]
    fn rows_without_outer_pipes_still_parse() {
        let tables = extract_tables("A | B\n1 | 2\n");
        assert_eq!(tables[0], vec![record(&[("A", "1"), ("B", "2")])]);
    }

    #[test]
    fn scanner_streaming_matches_whole_text_scan() {
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\n\n| X |\n| 9 |\n";
        let mut scanner = TableScanner::new();
        for line in text.lines() {
            scanner.push_line(line);
        }
        assert_eq!(scanner.finish(), extract_tables(text));
    }

    #[test]
    fn never_panics_on_odd_input() {
        for text in [
            "|||",
            "||",
            "|",
            "| a",
            "a |",
            "\u{00a0}| läft | ❤ |",
            "|---|\n|---|",
            "\n\n\n",
            "| a |\r\n| b |\r\n",
        ] {
            let _ = extract_tables(text);
        }
    }
}
