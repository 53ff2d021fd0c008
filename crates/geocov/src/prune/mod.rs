//! Re-share removal, text cleaning and checkpointing of raw batches.

mod checkpoint;
mod guard;
mod pruner;
mod report;

pub use checkpoint::{
    CheckpointStore, annotated_path, checkpoint_path, read_pruned, write_annotated, write_pruned,
};
pub use guard::{DestinationState, prepare_destination};
pub use pruner::{BatchSource, CorpusPruner};
pub use report::{BatchOutcome, PruneReport, PruneStats, SkipReason};
