//! Log file discovery and reading.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions the exporter writes; never read back as logs.
const OUTPUT_EXTENSIONS: &[&str] = &["json", "xlsx", "csv"];

/// Regular files under `dir`, recursively, sorted by path.
pub fn discover_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", path.display()))?;

        if file_type.is_dir() {
            walk(&path, files)?;
        } else if file_type.is_file() && !is_output_file(&path) {
            files.push(path);
        } else {
            log::debug!("Skipping {}", path.display());
        }
    }
    Ok(())
}

pub fn is_output_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| OUTPUT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads a log file into lines. Invalid UTF-8 is replaced, not rejected.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read log file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2025");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("maillog"), "a\n").unwrap();
        fs::write(dir.path().join("maillog.json"), "[]").unwrap();
        fs::write(dir.path().join("maillog.xlsx"), "PK").unwrap();
        fs::write(nested.join("maillog.1"), "b\n").unwrap();
        fs::write(nested.join("maillog.1.CSV"), "").unwrap();

        let files = discover_log_files(dir.path()).unwrap();
        assert_eq!(files, vec![nested.join("maillog.1"), dir.path().join("maillog")]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_log_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_read_lines_tolerates_bad_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maillog");
        fs::write(&path, b"first\r\nsec\xffond\nthird").unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "first");
        assert!(lines[1].starts_with("sec"));
        assert_eq!(lines[2], "third");
    }
}
