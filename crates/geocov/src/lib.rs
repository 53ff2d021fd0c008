//! Geocov: pruning and topic annotation for social-media post exports.
//!
//! Raw exports of a pandemic-era post corpus arrive in dated batches with
//! one of two column layouts. Geocov normalizes them onto one schema, drops
//! re-shares, cleans the text and writes a checkpoint per batch. Checkpoints
//! are then labeled with one boolean column per topic of interest.
//!
//! # Core Principles
//!
//! - **Raw data is read-only**: every stage writes new files
//! - **No silent overwrite**: existing checkpoints are never replaced
//! - **Explicit results**: counts are returned as reports, not kept globally
//!
//! # Example
//!
//! ```no_run
//! use geocov::{BatchSource, CorpusPruner, Layout, TopicAnnotator};
//!
//! let batches = vec![BatchSource::new("2005", "raw/tweets_20200501.csv", Layout::Lean)];
//! let report = CorpusPruner::default().prune_all(&batches, "pruned").unwrap();
//! println!("Written: {}", report.written());
//!
//! let store = geocov::CheckpointStore::new("pruned");
//! let pruned = store.load("2005").unwrap();
//! let annotated = TopicAnnotator::default()
//!     .annotate(pruned, &["five_g", "microchip"])
//!     .unwrap();
//! println!("5G posts: {}", annotated.match_count("five_g"));
//! ```

pub mod annotate;
pub mod clean;
pub mod convert;
pub mod error;
pub mod input;
pub mod prune;
pub mod schema;
pub mod storage;

mod pipeline;

pub use crate::pipeline::{Pipeline, PipelineConfig, RunReport};
pub use annotate::{AnnotationSummary, TopicAnnotator, TopicPattern, TopicRegistry};
pub use clean::{CleaningPolicy, TextCleaner};
pub use convert::{ConversionReport, convert_jsonl};
pub use error::{GeocovError, Result};
pub use input::{DataTable, SourceMetadata};
pub use prune::{BatchOutcome, BatchSource, CheckpointStore, CorpusPruner, PruneReport, SkipReason};
pub use schema::{AnnotatedBatch, Layout, Post, PrunedBatch, SchemaNormalizer};
