//! Checkpoint files: the durable boundary between pruning and annotation.
//!
//! Checkpoints are UTF-8, comma-delimited CSV with one header row in a fixed
//! column order. Fields containing delimiters or quotes are double-quoted
//! with embedded quotes doubled; there is no index column.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{GeocovError, Result};
use crate::input::Parser;
use crate::schema::{
    AnnotatedBatch, NullMarkers, PRUNED_COLUMNS, Post, PrunedBatch, ResolvedColumns, format_bool,
    format_timestamp, parse_rows,
};
use crate::storage;

const PRUNED_PREFIX: &str = "original_";
const ANNOTATED_PREFIX: &str = "annotated_";
const EXTENSION: &str = ".csv";

/// Path of the pruned checkpoint for `key`.
pub fn checkpoint_path(dir: impl AsRef<Path>, key: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("{}{}{}", PRUNED_PREFIX, key, EXTENSION))
}

/// Path of the annotated output for `key`.
pub fn annotated_path(dir: impl AsRef<Path>, key: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("{}{}{}", ANNOTATED_PREFIX, key, EXTENSION))
}

/// Write a pruned batch to a new checkpoint file.
///
/// Fails with an `AlreadyExists` IO error rather than replacing an existing
/// checkpoint. A partially written file is removed on failure.
pub fn write_pruned(path: impl AsRef<Path>, batch: &PrunedBatch) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| GeocovError::io(path, e))?;

    let result = write_rows(file, path, &batch.posts, &IndexMap::new());
    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result
}

/// Write an annotated batch, replacing any previous output for the same key.
///
/// Rows go to a temporary sibling first and are renamed into place, so a
/// failed run never leaves a truncated file behind.
pub fn write_annotated(path: impl AsRef<Path>, batch: &AnnotatedBatch) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("csv.tmp");
    let file = File::create(&tmp).map_err(|e| GeocovError::io(&tmp, e))?;

    if let Err(e) = write_rows(file, &tmp, &batch.posts, &batch.labels) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|e| GeocovError::io(path, e))
}

fn write_rows<W: Write>(
    sink: W,
    path: &Path,
    posts: &[Post],
    labels: &IndexMap<String, Vec<bool>>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(sink);

    let mut header: Vec<&str> = PRUNED_COLUMNS.to_vec();
    header.extend(labels.keys().map(|k| k.as_str()));
    writer.write_record(&header)?;

    for (row, post) in posts.iter().enumerate() {
        let mut record = vec![
            post.id.clone(),
            format_timestamp(&post.created_at),
            post.author_handle.clone(),
            optional_count(post.author_follower_count),
            optional_count(post.author_following_count),
            optional_count(post.reshare_count),
            optional_count(post.favorite_count),
            post.hashtags.clone().unwrap_or_default(),
            post.author_verified
                .map(|v| format_bool(v).to_string())
                .unwrap_or_default(),
            post.text.clone(),
        ];
        for column in labels.values() {
            let hit = column.get(row).copied().unwrap_or(false);
            record.push(format_bool(hit).to_string());
        }
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| GeocovError::io(path, e))
}

fn optional_count(value: Option<u64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Read a pruned checkpoint back into memory.
///
/// Returns the batch and the number of rows that could not be parsed.
pub fn read_pruned(path: impl AsRef<Path>, key: &str) -> Result<(PrunedBatch, usize)> {
    let path = path.as_ref();
    let (table, _) = Parser::new().read_file(path)?;

    let columns =
        ResolvedColumns::resolve_checkpoint(&table).map_err(|missing| GeocovError::SchemaMismatch {
            path: path.to_path_buf(),
            expected: "checkpoint".to_string(),
            missing,
        })?;

    let (rows, skipped) = parse_rows(&table, &columns, NullMarkers::EmptyOnly);
    let skipped = skipped + table.unreadable_rows;
    if skipped > 0 {
        warn!(key, skipped_rows = skipped, "checkpoint rows skipped");
    }

    let posts = rows.into_iter().map(|row| row.into_post()).collect();
    Ok((PrunedBatch::new(key, posts), skipped))
}

/// Pruned checkpoints in one directory, addressed by batch key.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys of every checkpoint present, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        if !storage::is_directory(&self.dir) {
            return Err(GeocovError::SourceNotFound {
                path: self.dir.clone(),
            });
        }

        let keys = storage::list_files(&self.dir)?
            .iter()
            .filter_map(|path| path.file_name()?.to_str())
            .filter_map(|name| {
                name.strip_prefix(PRUNED_PREFIX)?
                    .strip_suffix(EXTENSION)
                    .map(|key| key.to_string())
            })
            .filter(|key| !key.is_empty())
            .collect();

        Ok(keys)
    }

    /// Whether a checkpoint exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        checkpoint_path(&self.dir, key).is_file()
    }

    /// Load the checkpoint for `key`.
    pub fn load(&self, key: &str) -> Result<PrunedBatch> {
        let path = checkpoint_path(&self.dir, key);
        let (batch, _) = read_pruned(&path, key)?;
        debug!(key, rows = batch.len(), "checkpoint loaded");
        Ok(batch)
    }

    /// Load every checkpoint one at a time, in key order.
    ///
    /// Only the batch currently yielded is held in memory.
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<PrunedBatch>> + '_> {
        let keys = self.keys()?;
        Ok(keys.into_iter().map(move |key| self.load(&key)))
    }
}
