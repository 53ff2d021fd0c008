//! Raw table representation and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a raw export file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Parsed tabular data, every cell kept as text.
#[derive(Debug, Clone)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// Records the reader could not decode.
    pub unreadable_rows: usize,
}

impl DataTable {
    /// Create a new data table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            unreadable_rows: 0,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of the first header matching any of the given names.
    pub fn find_column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.column_index(name))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nan")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::new(
            vec!["id".into(), "favourite_count".into(), "text".into()],
            vec![vec!["1".into(), "4".into(), "hello".into()]],
        )
    }

    #[test]
    fn test_find_column_with_aliases() {
        let t = table();
        assert_eq!(t.find_column(&["favorite_count", "favourite_count"]), Some(1));
        assert_eq!(t.find_column(&["retweet_count"]), None);
        assert_eq!(t.get(0, 2), Some("hello"));
    }

    #[test]
    fn test_is_null_value() {
        assert!(DataTable::is_null_value(""));
        assert!(DataTable::is_null_value("  "));
        assert!(DataTable::is_null_value("NA"));
        assert!(DataTable::is_null_value("NaN"));
        assert!(DataTable::is_null_value("null"));
        assert!(!DataTable::is_null_value("0"));
        assert!(!DataTable::is_null_value("False"));
    }
}
