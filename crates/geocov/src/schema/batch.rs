//! Batch values passed between pipeline stages.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::layout::Layout;
use super::post::{Post, RawPost};
use crate::error::{GeocovError, Result};
use crate::input::SourceMetadata;

/// A raw batch mapped onto the canonical schema.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub key: String,
    pub layout: Layout,
    pub rows: Vec<RawPost>,
    /// Rows dropped for malformed fields or repeated ids.
    pub skipped_rows: usize,
    pub source: SourceMetadata,
}

/// A de-duplicated, cleaned batch without the `reshare_of_id` column.
#[derive(Debug, Clone, PartialEq)]
pub struct PrunedBatch {
    pub key: String,
    pub posts: Vec<Post>,
}

impl PrunedBatch {
    pub fn new(key: impl Into<String>, posts: Vec<Post>) -> Self {
        Self {
            key: key.into(),
            posts,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// A pruned batch with one boolean column per applied topic.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedBatch {
    pub key: String,
    pub posts: Vec<Post>,
    /// Label columns in the order they were applied.
    pub labels: IndexMap<String, Vec<bool>>,
}

impl AnnotatedBatch {
    /// Label column for a topic, if it has been applied.
    pub fn label(&self, topic: &str) -> Option<&[bool]> {
        self.labels.get(topic).map(|v| v.as_slice())
    }

    /// Names of the applied topic columns.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(|k| k.as_str())
    }

    /// Number of rows labeled true for a topic.
    pub fn match_count(&self, topic: &str) -> usize {
        self.label(topic)
            .map(|col| col.iter().filter(|&&hit| hit).count())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl From<PrunedBatch> for AnnotatedBatch {
    fn from(batch: PrunedBatch) -> Self {
        Self {
            key: batch.key,
            posts: batch.posts,
            labels: IndexMap::new(),
        }
    }
}

/// Check that a batch key can be embedded in a checkpoint file name.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(GeocovError::InvalidKey(key.to_string()))
    }
}

/// Check every key and reject repeats before anything is written.
pub fn validate_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for key in keys {
        validate_key(key)?;
        if !seen.insert(key) {
            return Err(GeocovError::DuplicateKey(key.to_string()));
        }
    }
    Ok(())
}
