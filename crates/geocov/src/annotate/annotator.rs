//! Applies topic patterns to pruned batches.

use std::path::Path;

use indexmap::IndexMap;
use tracing::{error, info, warn};

use super::registry::{TopicPattern, TopicRegistry};
use super::summary::AnnotationSummary;
use crate::error::Result;
use crate::prune::{CheckpointStore, annotated_path, prepare_destination, write_annotated};
use crate::schema::{AnnotatedBatch, Post, PrunedBatch, validate_keys};
use crate::storage;

/// Labels batches with one boolean column per topic.
pub struct TopicAnnotator {
    registry: TopicRegistry,
}

impl TopicAnnotator {
    pub fn new(registry: TopicRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// Compute the label column for one topic. Pure in the post text.
    pub fn label_column(&self, posts: &[Post], topic: &str) -> Result<(String, Vec<bool>)> {
        let pattern = self.registry.get(topic)?;
        Ok((pattern.name().to_string(), apply(pattern, posts)))
    }

    /// Add (or recompute) one topic column on a batch.
    ///
    /// An unknown topic leaves the batch and its existing columns untouched.
    pub fn label(&self, batch: &mut AnnotatedBatch, topic: &str) -> Result<()> {
        let (name, column) = self.label_column(&batch.posts, topic)?;
        batch.labels.insert(name, column);
        Ok(())
    }

    /// Label one pruned batch with every topic, in order.
    pub fn annotate<S: AsRef<str>>(&self, batch: PrunedBatch, topics: &[S]) -> Result<AnnotatedBatch> {
        let patterns = self.registry.resolve(topics)?;
        Ok(annotate_with(&patterns, batch))
    }

    /// Label every batch and optionally persist each one to `output_dir`.
    ///
    /// Topics and keys are checked before any labeling: an unknown topic
    /// fails with `UnknownTopic`, a repeated key with `DuplicateKey`. When
    /// persisting, `output_dir` is created if missing and must be a
    /// directory; existing annotated files for the same keys are replaced.
    pub fn annotate_all<S: AsRef<str>>(
        &self,
        batches: Vec<PrunedBatch>,
        topics: &[S],
        persist: bool,
        output_dir: impl AsRef<Path>,
    ) -> Result<IndexMap<String, AnnotatedBatch>> {
        let output_dir = output_dir.as_ref();
        let patterns = self.registry.resolve(topics)?;
        validate_keys(batches.iter().map(|b| b.key.as_str()))?;
        if persist {
            prepare_destination(output_dir)?;
        }

        let mut annotated = IndexMap::with_capacity(batches.len());
        for batch in batches {
            let batch = annotate_with(&patterns, batch);
            log_counts(&batch);
            if persist {
                let path = annotated_path(output_dir, &batch.key);
                write_annotated(&path, &batch)?;
                info!(key = %batch.key, path = %path.display(), "annotated batch saved");
            }
            annotated.insert(batch.key.clone(), batch);
        }

        Ok(annotated)
    }

    /// Annotate every checkpoint in `store`, one batch in memory at a time.
    ///
    /// Counts go into `summary`. A checkpoint that cannot be loaded or
    /// written is logged, recorded as a failure and skipped. A missing
    /// checkpoint directory holds no checkpoints and leaves `summary` empty.
    pub fn annotate_checkpoints<S: AsRef<str>>(
        &self,
        store: &CheckpointStore,
        topics: &[S],
        output_dir: Option<&Path>,
        summary: &mut AnnotationSummary,
    ) -> Result<()> {
        let patterns = self.registry.resolve(topics)?;
        if !storage::is_directory(store.dir()) {
            warn!(path = %store.dir().display(), "no checkpoint directory, nothing to annotate");
            return Ok(());
        }
        if let Some(dir) = output_dir {
            prepare_destination(dir)?;
        }

        for key in store.keys()? {
            let batch = match store.load(&key) {
                Ok(batch) => annotate_with(&patterns, batch),
                Err(e) => {
                    error!(key = %key, error = %e, "checkpoint skipped");
                    summary.record_failure(&key, e.to_string());
                    continue;
                }
            };
            log_counts(&batch);

            let output = match output_dir {
                Some(dir) => {
                    let path = annotated_path(dir, &key);
                    if let Err(e) = write_annotated(&path, &batch) {
                        error!(key = %key, error = %e, "annotated batch not saved");
                        summary.record_failure(&key, e.to_string());
                        continue;
                    }
                    info!(key = %key, path = %path.display(), "annotated batch saved");
                    Some(path)
                }
                None => None,
            };
            summary.record(&batch, output);
        }

        Ok(())
    }
}

impl Default for TopicAnnotator {
    fn default() -> Self {
        Self::new(TopicRegistry::builtin())
    }
}

fn apply(pattern: &TopicPattern, posts: &[Post]) -> Vec<bool> {
    posts.iter().map(|post| pattern.matches(&post.text)).collect()
}

fn annotate_with(patterns: &[&TopicPattern], batch: PrunedBatch) -> AnnotatedBatch {
    let mut annotated = AnnotatedBatch::from(batch);
    for pattern in patterns {
        let column = apply(pattern, &annotated.posts);
        annotated.labels.insert(pattern.name().to_string(), column);
    }
    annotated
}

fn log_counts(batch: &AnnotatedBatch) {
    for topic in batch.topics() {
        info!(
            key = %batch.key,
            topic,
            matches = batch.match_count(topic),
            rows = batch.len(),
            "batch annotated"
        );
    }
}
