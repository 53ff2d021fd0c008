//! Maps raw export tables onto the canonical post schema.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use super::batch::NormalizedBatch;
use super::layout::{Layout, ResolvedColumns};
use super::post::{Post, RawPost};
use super::values::{parse_bool, parse_count, parse_timestamp};
use crate::error::{GeocovError, Result};
use crate::input::{DataTable, Parser};

/// Normalizes raw batches of either layout to the canonical schema.
pub struct SchemaNormalizer {
    parser: Parser,
}

impl SchemaNormalizer {
    /// Create a normalizer reading with the default parser.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Create a normalizer with a custom parser.
    pub fn with_parser(parser: Parser) -> Self {
        Self { parser }
    }

    /// Read a raw file and normalize it.
    ///
    /// Fails with `SourceNotFound` or `SchemaMismatch`; malformed rows are
    /// skipped and counted rather than failing the batch.
    pub fn load(
        &self,
        key: &str,
        path: impl AsRef<Path>,
        layout: Layout,
        already_pruned: bool,
    ) -> Result<NormalizedBatch> {
        let path = path.as_ref();
        let (table, source) = self.parser.read_file(path)?;
        let (rows, skipped) = self.normalize(&table, path, layout, already_pruned)?;
        let skipped_rows = skipped + table.unreadable_rows;

        if skipped_rows > 0 {
            warn!(key, skipped_rows, "rows skipped during normalization");
        }
        info!(
            key,
            %layout,
            rows = rows.len(),
            hash = %source.hash,
            "batch normalized"
        );

        Ok(NormalizedBatch {
            key: key.to_string(),
            layout,
            rows,
            skipped_rows,
            source,
        })
    }

    /// Normalize an already parsed table. Returns the rows and the number skipped.
    pub fn normalize(
        &self,
        table: &DataTable,
        path: &Path,
        layout: Layout,
        already_pruned: bool,
    ) -> Result<(Vec<RawPost>, usize)> {
        let columns = ResolvedColumns::resolve(table, layout, already_pruned).map_err(|missing| {
            GeocovError::SchemaMismatch {
                path: path.to_path_buf(),
                expected: format!("{} layout", layout),
                missing,
            }
        })?;

        Ok(parse_rows(table, &columns, NullMarkers::Raw))
    }
}

/// Which text cells read back as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NullMarkers {
    /// Empty cells and the `NA`/`null`/`none` family found in raw exports.
    Raw,
    /// Empty cells only. Checkpoints write nulls as empty fields, so a
    /// literal `NA` there is data.
    EmptyOnly,
}

impl NullMarkers {
    fn nullable_text(self, value: &str) -> Option<String> {
        let is_null = match self {
            NullMarkers::Raw => DataTable::is_null_value(value),
            NullMarkers::EmptyOnly => value.trim().is_empty(),
        };
        (!is_null).then(|| value.trim().to_string())
    }
}

/// Parse every row of a table against resolved column positions.
///
/// Rows with malformed fields or an already seen id are skipped; returns the
/// parsed rows and the number skipped.
pub(crate) fn parse_rows(
    table: &DataTable,
    columns: &ResolvedColumns,
    nulls: NullMarkers,
) -> (Vec<RawPost>, usize) {
    let mut rows = Vec::with_capacity(table.row_count());
    let mut seen_ids = HashSet::with_capacity(table.row_count());
    let mut skipped = 0;

    for (row_idx, row) in table.rows.iter().enumerate() {
        match normalize_row(row, row_idx + 1, columns, nulls) {
            Ok(post) if !seen_ids.insert(post.post.id.clone()) => {
                debug!(row = row_idx + 1, id = %post.post.id, "repeated id skipped");
                skipped += 1;
            }
            Ok(post) => rows.push(post),
            Err(e) => {
                debug!(error = %e, "row skipped");
                skipped += 1;
            }
        }
    }

    (rows, skipped)
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn cell(row: &[String], position: Option<usize>) -> &str {
    position
        .and_then(|i| row.get(i))
        .map(|s| s.as_str())
        .unwrap_or("")
}

fn row_error(row: usize, column: &str, message: String) -> GeocovError {
    GeocovError::RowParse {
        row,
        column: column.to_string(),
        message,
    }
}

fn normalize_row(
    row: &[String],
    row_number: usize,
    columns: &ResolvedColumns,
    nulls: NullMarkers,
) -> Result<RawPost> {
    let id = cell(row, columns.id).trim();
    if DataTable::is_null_value(id) {
        return Err(row_error(row_number, "id", "missing id".to_string()));
    }

    let created_at = parse_timestamp(cell(row, columns.created_at))
        .map_err(|m| row_error(row_number, "created_at", m))?;

    let count = |position: Option<usize>, name: &str| {
        parse_count(cell(row, position)).map_err(|m| row_error(row_number, name, m))
    };

    let post = Post {
        id: id.to_string(),
        created_at,
        author_handle: cell(row, columns.author_handle).trim().to_string(),
        author_follower_count: count(columns.author_follower_count, "author_follower_count")?,
        author_following_count: count(columns.author_following_count, "author_following_count")?,
        reshare_count: count(columns.reshare_count, "reshare_count")?,
        favorite_count: count(columns.favorite_count, "favorite_count")?,
        hashtags: nulls.nullable_text(cell(row, columns.hashtags)),
        author_verified: parse_bool(cell(row, columns.author_verified))
            .map_err(|m| row_error(row_number, "author_verified", m))?,
        text: cell(row, columns.text).to_string(),
    };

    Ok(RawPost {
        reshare_of_id: nulls.nullable_text(cell(row, columns.reshare_of_id)),
        post,
    })
}
