//! Canonical post schema, raw layouts and normalization.

mod batch;
mod layout;
mod normalizer;
mod post;
mod values;

pub use batch::{AnnotatedBatch, NormalizedBatch, PrunedBatch, validate_key, validate_keys};
pub use layout::{CanonicalColumn, ColumnSpec, Layout, ResolvedColumns};
pub use normalizer::SchemaNormalizer;
pub(crate) use normalizer::{NullMarkers, parse_rows};
pub use post::{CANONICAL_COLUMNS, PRUNED_COLUMNS, Post, RawPost};
pub use values::{format_bool, format_timestamp, parse_bool, parse_count, parse_timestamp};
