//! Accumulated label counts across annotated batches.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::AnnotatedBatch;

/// Label counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLabelCounts {
    pub rows: usize,
    /// Rows labeled true, per topic column.
    pub matches: IndexMap<String, usize>,
    /// Where the annotated batch was written, if it was persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Explicit accumulator for cross-batch analysis.
///
/// Callers pass one in and read it back; the pipeline keeps no shared
/// result state of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationSummary {
    pub batches: IndexMap<String, BatchLabelCounts>,
    /// Checkpoints that could not be annotated, with the error message.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub failed: IndexMap<String, String>,
}

impl AnnotationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the label counts of an annotated batch.
    pub fn record(&mut self, batch: &AnnotatedBatch, output: Option<PathBuf>) {
        let matches = batch
            .topics()
            .map(|topic| (topic.to_string(), batch.match_count(topic)))
            .collect();

        self.batches.insert(
            batch.key.clone(),
            BatchLabelCounts {
                rows: batch.len(),
                matches,
                output,
            },
        );
    }

    /// Record a batch that could not be annotated.
    pub fn record_failure(&mut self, key: &str, message: String) {
        self.failed.insert(key.to_string(), message);
    }

    /// Rows across every recorded batch.
    pub fn total_rows(&self) -> usize {
        self.batches.values().map(|b| b.rows).sum()
    }

    /// Rows labeled true for `topic` across every recorded batch.
    pub fn total_matches(&self, topic: &str) -> usize {
        self.batches
            .values()
            .filter_map(|b| b.matches.get(topic))
            .sum()
    }

    /// Topic columns seen, in first-seen order.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = Vec::new();
        for counts in self.batches.values() {
            for topic in counts.matches.keys() {
                if !topics.contains(&topic.as_str()) {
                    topics.push(topic);
                }
            }
        }
        topics
    }
}
