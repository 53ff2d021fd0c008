//! Write-safety checks on checkpoint and output directories.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GeocovError, Result};
use crate::storage;

/// State of a destination directory once it has been prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DestinationState {
    /// The directory (and any missing ancestors) was created.
    Created,
    /// The directory already existed with no entries.
    Empty,
    /// The directory already held entries; existing files may be stale.
    Populated { entries: usize },
}

impl DestinationState {
    pub fn is_populated(&self) -> bool {
        matches!(self, DestinationState::Populated { .. })
    }
}

/// Make sure `dir` exists as a directory, creating it when absent.
///
/// Fails with `InvalidDestination` when the path exists but is not a
/// directory; nothing is created or written in that case. Never removes
/// existing entries.
pub fn prepare_destination(dir: impl AsRef<Path>) -> Result<DestinationState> {
    let dir = dir.as_ref();

    if !storage::exists(dir) {
        storage::create_recursive(dir)?;
        debug!(path = %dir.display(), "destination created");
        return Ok(DestinationState::Created);
    }

    if !storage::is_directory(dir) {
        return Err(GeocovError::InvalidDestination {
            path: dir.to_path_buf(),
        });
    }

    if storage::is_empty(dir)? {
        Ok(DestinationState::Empty)
    } else {
        Ok(DestinationState::Populated {
            entries: storage::entry_count(dir)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_destination_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("deep").join("pruned");
        assert_eq!(prepare_destination(&dir).unwrap(), DestinationState::Created);
        assert!(dir.is_dir());
        assert_eq!(prepare_destination(&dir).unwrap(), DestinationState::Empty);
    }

    #[test]
    fn test_populated_destination_is_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("original_2002.csv"), "keep").unwrap();
        fs::create_dir(tmp.path().join("scratch")).unwrap();

        let state = prepare_destination(tmp.path()).unwrap();
        assert_eq!(state, DestinationState::Populated { entries: 2 });
        assert!(state.is_populated());
        assert_eq!(
            fs::read_to_string(tmp.path().join("original_2002.csv")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn test_file_destination_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not_a_dir");
        fs::write(&file, "x").unwrap();

        let err = prepare_destination(&file).unwrap_err();
        assert!(matches!(err, GeocovError::InvalidDestination { .. }));
        assert_eq!(fs::read_to_string(&file).unwrap(), "x");
    }
}
