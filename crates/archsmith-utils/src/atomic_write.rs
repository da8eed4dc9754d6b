//! Atomic file writes
//!
//! Content is written to a temporary file next to the target, fsynced, then renamed over
//! the target. Line endings are normalized to LF.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

use crate::text::normalize_line_endings;

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Bytes written after line-ending normalization
    pub bytes_written: usize,
    /// Whether the parent directory had to be created
    pub created_parent: bool,
}

/// Atomically write `content` to `path` using temp file + fsync + rename.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, or the temporary file cannot
/// be written, synced or persisted.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();
    let normalized = normalize_line_endings(content);

    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {parent}"))?;
        result.created_parent = true;
    }

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;

    temp_file
        .write_all(normalized.as_bytes())
        .context("Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    temp_file
        .persist(path.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| format!("Failed to atomically write file: {path}"))?;

    result.bytes_written = normalized.len();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path")
    }

    #[test]
    fn test_write_creates_file_with_lf_endings() -> Result<()> {
        let dir = TempDir::new()?;
        let path = utf8_dir(&dir).join("out.md");

        let result = write_file_atomic(&path, "# Title\r\n\r\nBody\r\n")?;

        assert_eq!(fs::read_to_string(&path)?, "# Title\n\nBody\n");
        assert_eq!(result.bytes_written, "# Title\n\nBody\n".len());
        assert!(!result.created_parent);
        Ok(())
    }

    #[test]
    fn test_write_creates_missing_parent_and_overwrites() -> Result<()> {
        let dir = TempDir::new()?;
        let path = utf8_dir(&dir).join("nested").join("doc.md");

        let first = write_file_atomic(&path, "first")?;
        assert!(first.created_parent);
        write_file_atomic(&path, "second")?;

        assert_eq!(fs::read_to_string(&path)?, "second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().expect("parent"))?
            .filter_map(std::result::Result::ok)
            .collect();
        assert_eq!(leftovers.len(), 1, "temporary files must not be left behind");
        Ok(())
    }
}
