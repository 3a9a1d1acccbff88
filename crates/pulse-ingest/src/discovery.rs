//! Report file discovery.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_csv(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Expands inputs into report files: directories contribute their CSV files,
/// plain paths are kept as given.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(list_csv_files(input)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in &["b_pages.csv", "a_landing.CSV", "notes.txt"] {
            std::fs::write(dir.path().join(name), "banner\nheader\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();
        dir
    }

    #[test]
    fn test_list_csv_files() {
        let dir = create_test_dir();
        let files = list_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_landing.CSV", "b_pages.csv"]);
    }

    #[test]
    fn test_missing_directory() {
        let err = list_csv_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_expand_inputs_mixes_files_and_dirs() {
        let dir = create_test_dir();
        let single = dir.path().join("notes.txt");
        let files = expand_inputs(&[single.clone(), dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], single);
    }
}
