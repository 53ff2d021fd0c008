//! Pattern-based topic labeling of pruned batches.

mod annotator;
mod registry;
mod summary;

pub use annotator::TopicAnnotator;
pub use registry::{TopicPattern, TopicRegistry, normalize_topic};
pub use summary::{AnnotationSummary, BatchLabelCounts};
