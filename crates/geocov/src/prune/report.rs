//! Results of a pruning run.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::guard::DestinationState;
use crate::input::SourceMetadata;

/// Why a batch produced no checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A checkpoint for this key already exists and was kept.
    DestinationOccupied,
    /// The raw file does not exist.
    SourceNotFound,
    /// The raw columns do not match the declared layout.
    SchemaMismatch,
    /// The raw file or checkpoint could not be read or written.
    Unreadable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DestinationOccupied => write!(f, "destination not empty"),
            SkipReason::SourceNotFound => write!(f, "source not found"),
            SkipReason::SchemaMismatch => write!(f, "schema mismatch"),
            SkipReason::Unreadable => write!(f, "unreadable"),
        }
    }
}

/// Row counts for one pruned batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneStats {
    /// Rows that survived normalization.
    pub rows_in: usize,
    /// Re-shares removed.
    pub reshares_dropped: usize,
    /// Rows left after pruning.
    pub rows_out: usize,
    /// Rows whose text changed during cleaning.
    pub texts_cleaned: usize,
    /// Malformed rows dropped during normalization.
    pub skipped_rows: usize,
}

/// What happened to one input batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Written {
        path: PathBuf,
        stats: PruneStats,
        source: SourceMetadata,
    },
    Skipped {
        reason: SkipReason,
        detail: String,
    },
}

impl BatchOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, BatchOutcome::Written { .. })
    }
}

/// Report returned by `CorpusPruner::prune_all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneReport {
    pub checkpoint_dir: PathBuf,
    pub destination: DestinationState,
    /// One outcome per batch key, in input order.
    pub batches: IndexMap<String, BatchOutcome>,
}

impl PruneReport {
    pub fn new(checkpoint_dir: PathBuf, destination: DestinationState) -> Self {
        Self {
            checkpoint_dir,
            destination,
            batches: IndexMap::new(),
        }
    }

    pub fn written(&self) -> usize {
        self.batches.values().filter(|o| o.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.batches.len() - self.written()
    }

    /// Outcome recorded for `key`.
    pub fn outcome(&self, key: &str) -> Option<&BatchOutcome> {
        self.batches.get(key)
    }
}
