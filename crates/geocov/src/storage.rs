//! Directory bookkeeping used by the checkpoint stages.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeocovError, Result};

/// Whether anything exists at `path`.
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Whether `path` is an existing directory.
pub fn is_directory(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

/// Whether the directory at `path` has no entries.
pub fn is_empty(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    let mut entries = fs::read_dir(path).map_err(|e| GeocovError::io(path, e))?;
    Ok(entries.next().is_none())
}

/// Number of entries of any kind directly inside `path`.
pub fn entry_count(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    Ok(fs::read_dir(path).map_err(|e| GeocovError::io(path, e))?.count())
}

/// Create `path` and any missing ancestors.
pub fn create_recursive(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).map_err(|e| GeocovError::io(path, e))
}

/// Remove a directory tree. Missing paths are not an error.
pub fn remove_recursive(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    fs::remove_dir_all(path).map_err(|e| GeocovError::io(path, e))
}

/// Regular files directly inside `path`, sorted by name.
pub fn list_files(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = fs::read_dir(path)
        .map_err(|e| GeocovError::io(path, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_inspect() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");

        assert!(!exists(&nested));
        create_recursive(&nested).unwrap();
        assert!(is_directory(&nested));
        assert!(is_empty(&nested).unwrap());

        fs::write(nested.join("z.csv"), "x").unwrap();
        fs::write(nested.join("a.csv"), "y").unwrap();
        fs::create_dir(nested.join("sub")).unwrap();
        assert!(!is_empty(&nested).unwrap());
        assert_eq!(entry_count(&nested).unwrap(), 3);

        let names: Vec<String> = list_files(&nested)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "z.csv"]);

        remove_recursive(tmp.path().join("a")).unwrap();
        assert!(!exists(tmp.path().join("a")));
        remove_recursive(tmp.path().join("a")).unwrap();
    }

    #[test]
    fn test_is_empty_on_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, "x").unwrap();
        assert!(!is_directory(&file));
        assert!(is_empty(&file).is_err());
        assert!(entry_count(&file).is_err());
    }
}
