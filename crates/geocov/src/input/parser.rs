//! Delimited reader for raw post exports.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::source::{DataTable, SourceMetadata};
use crate::error::{GeocovError, Result};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            max_rows: None,
        }
    }
}

/// Reads raw export files into a [`DataTable`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Whether a raw source exists at `path`.
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Read a file and return the data table and its metadata.
    ///
    /// Records the csv reader cannot decode (bad UTF-8, broken quoting) are
    /// skipped and counted in `DataTable::unreadable_rows`.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        if !Self::exists(path) {
            return Err(GeocovError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut file = File::open(path).map_err(|e| GeocovError::io(path, e))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| GeocovError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let table = self.parse_bytes(&contents)?;
        if table.unreadable_rows > 0 {
            warn!(
                path = %path.display(),
                unreadable_rows = table.unreadable_rows,
                "skipped undecodable records"
            );
        }
        debug!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "raw table loaded"
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse bytes directly.
    pub(crate) fn parse_bytes(&self, bytes: &[u8]) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .quote(self.config.quote)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let expected_cols = headers.len();

        let mut rows = Vec::new();
        let mut unreadable = 0;

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    debug!(row = row_idx, error = %e, "unreadable record");
                    unreadable += 1;
                    continue;
                }
            };

            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            // Short rows are padded, long rows truncated to the header width
            row.resize(expected_cols, String::new());
            rows.push(row);
        }

        let mut table = DataTable::new(headers, rows);
        table.unreadable_rows = unreadable;
        Ok(table)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
