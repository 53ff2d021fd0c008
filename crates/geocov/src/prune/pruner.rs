//! Re-share removal and text cleaning over a collection of raw batches.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::checkpoint::{checkpoint_path, write_pruned};
use super::guard::{DestinationState, prepare_destination};
use super::report::{BatchOutcome, PruneReport, PruneStats, SkipReason};
use crate::clean::{CleaningPolicy, TextCleaner};
use crate::error::{GeocovError, Result};
use crate::schema::{Layout, NormalizedBatch, PrunedBatch, SchemaNormalizer, validate_keys};

/// One raw batch to prune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSource {
    /// Checkpoint key, e.g. the collection date.
    pub key: String,
    /// Location of the raw export.
    pub path: PathBuf,
    pub layout: Layout,
    /// The raw file has no `reshare_of_id` column left.
    #[serde(default)]
    pub already_pruned: bool,
}

impl BatchSource {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            layout,
            already_pruned: false,
        }
    }

    pub fn already_pruned(mut self, already_pruned: bool) -> Self {
        self.already_pruned = already_pruned;
        self
    }
}

/// Removes re-shares, cleans text and checkpoints each batch.
pub struct CorpusPruner {
    normalizer: SchemaNormalizer,
    cleaner: TextCleaner,
}

impl CorpusPruner {
    /// Create a pruner with the given cleaning policy.
    pub fn new(policy: CleaningPolicy) -> Self {
        Self {
            normalizer: SchemaNormalizer::new(),
            cleaner: TextCleaner::new(policy),
        }
    }

    /// Replace the normalizer used to load raw batches.
    pub fn with_normalizer(mut self, normalizer: SchemaNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Prune every batch into `checkpoint_dir`.
    ///
    /// Key validation and the directory guard run before anything is read
    /// or written; their failures (`InvalidKey`, `DuplicateKey`,
    /// `InvalidDestination`) abort the run. When the directory already
    /// holds files, a warning is logged and only batches without an
    /// existing checkpoint are written: existing checkpoints are never
    /// replaced. Load failures skip the batch and the run continues.
    pub fn prune_all(
        &self,
        batches: &[BatchSource],
        checkpoint_dir: impl AsRef<Path>,
    ) -> Result<PruneReport> {
        let dir = checkpoint_dir.as_ref();

        validate_keys(batches.iter().map(|b| b.key.as_str()))?;
        let destination = prepare_destination(dir)?;
        if let DestinationState::Populated { entries } = destination {
            warn!(
                path = %dir.display(),
                entries,
                "checkpoint directory is not empty; existing files may be stale and will not be overwritten"
            );
        }

        let mut report = PruneReport::new(dir.to_path_buf(), destination);

        // One batch resident at a time: each is dropped before the next loads
        for source in batches {
            let outcome = self.prune_one(source, dir);
            report.batches.insert(source.key.clone(), outcome);
        }

        info!(
            written = report.written(),
            skipped = report.skipped(),
            "pruning finished"
        );
        Ok(report)
    }

    fn prune_one(&self, source: &BatchSource, dir: &Path) -> BatchOutcome {
        let key = source.key.as_str();
        let target = checkpoint_path(dir, key);

        if target.exists() {
            warn!(key, path = %target.display(), "checkpoint exists, batch skipped");
            return skipped(SkipReason::DestinationOccupied, &target.display().to_string());
        }

        let normalized = match self.normalizer.load(
            key,
            &source.path,
            source.layout,
            source.already_pruned,
        ) {
            Ok(batch) => batch,
            Err(e) => {
                error!(key, error = %e, "batch skipped");
                return skipped(skip_reason(&e), &e.to_string());
            }
        };
        let metadata = normalized.source.clone();

        let (pruned, stats) = self.prune(normalized);

        match write_pruned(&target, &pruned) {
            Ok(()) => {
                info!(
                    key,
                    rows = stats.rows_out,
                    reshares_dropped = stats.reshares_dropped,
                    skipped_rows = stats.skipped_rows,
                    path = %target.display(),
                    "checkpoint written"
                );
                BatchOutcome::Written {
                    path: target,
                    stats,
                    source: metadata,
                }
            }
            Err(GeocovError::Io { source: e, .. })
                if e.kind() == std::io::ErrorKind::AlreadyExists =>
            {
                warn!(key, "checkpoint appeared during the run, batch skipped");
                skipped(SkipReason::DestinationOccupied, &target.display().to_string())
            }
            Err(e) => {
                error!(key, error = %e, "checkpoint write failed");
                skipped(SkipReason::Unreadable, &e.to_string())
            }
        }
    }

    /// Drop re-shares and clean text. Row order is preserved.
    pub fn prune(&self, batch: NormalizedBatch) -> (PrunedBatch, PruneStats) {
        let rows_in = batch.rows.len();
        let carries_extras = batch.layout.carries_profile_extras();
        let mut texts_cleaned = 0;

        let posts: Vec<_> = batch
            .rows
            .into_iter()
            .filter(|row| row.is_original())
            .map(|row| {
                let mut post = row.into_post();
                let cleaned = self.cleaner.clean(&post.text);
                if cleaned != post.text {
                    texts_cleaned += 1;
                    post.text = cleaned;
                }
                if !carries_extras {
                    post.hashtags = None;
                    post.author_verified = None;
                }
                post
            })
            .collect();

        let stats = PruneStats {
            rows_in,
            reshares_dropped: rows_in - posts.len(),
            rows_out: posts.len(),
            texts_cleaned,
            skipped_rows: batch.skipped_rows,
        };

        (PrunedBatch::new(batch.key, posts), stats)
    }
}

impl Default for CorpusPruner {
    fn default() -> Self {
        Self::new(CleaningPolicy::default())
    }
}

fn skipped(reason: SkipReason, detail: &str) -> BatchOutcome {
    BatchOutcome::Skipped {
        reason,
        detail: detail.to_string(),
    }
}

fn skip_reason(error: &GeocovError) -> SkipReason {
    match error {
        GeocovError::SourceNotFound { .. } => SkipReason::SourceNotFound,
        GeocovError::SchemaMismatch { .. } => SkipReason::SchemaMismatch,
        _ => SkipReason::Unreadable,
    }
}
