//! Document sinks

use std::sync::Mutex;

use archsmith_config::ExportConfig;
use archsmith_utils::atomic_write::write_file_atomic;
use archsmith_utils::error::ExportError;
use archsmith_utils::text::normalize_line_endings;
use camino::Utf8Path;
use tracing::info;

/// Prepended to exported documents when viewing notes are enabled.
pub const VIEWING_NOTES: &str = "<!--
Viewing notes: the architecture diagram is a Mermaid block.
It renders natively on GitHub and GitLab, in VS Code with a Mermaid preview extension,
and at https://mermaid.live when pasted there.
-->

";

pub trait DocumentSink: Send + Sync {
    /// # Errors
    ///
    /// Returns `ExportError` when `destination` is unusable or the write fails
    fn write(&self, document_text: &str, destination: &str) -> Result<(), ExportError>;
}

/// Writes documents to the filesystem atomically.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink {
    include_viewing_notes: bool,
}

impl FileSink {
    #[must_use]
    pub const fn new(include_viewing_notes: bool) -> Self {
        Self {
            include_viewing_notes,
        }
    }

    #[must_use]
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.include_viewing_notes)
    }
}

impl DocumentSink for FileSink {
    fn write(&self, document_text: &str, destination: &str) -> Result<(), ExportError> {
        let trimmed = destination.trim();
        if trimmed.is_empty() || trimmed.ends_with('/') || trimmed.ends_with('\\') {
            return Err(ExportError::InvalidDestination {
                destination: destination.to_string(),
            });
        }

        let path = Utf8Path::new(trimmed);
        if path.is_dir() {
            return Err(ExportError::InvalidDestination {
                destination: destination.to_string(),
            });
        }

        let content = if self.include_viewing_notes {
            format!("{VIEWING_NOTES}{document_text}")
        } else {
            document_text.to_string()
        };

        let result = write_file_atomic(path, &content).map_err(|e| ExportError::Write {
            destination: destination.to_string(),
            reason: format!("{e:#}"),
        })?;

        info!(
            destination = %path,
            bytes = result.bytes_written,
            created_parent = result.created_parent,
            "Exported architecture document"
        );
        Ok(())
    }
}

/// Keeps written documents in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    written: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(destination, text)` pairs in write order.
    #[must_use]
    pub fn written(&self) -> Vec<(String, String)> {
        self.written
            .lock()
            .map(|w| w.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DocumentSink for MemorySink {
    fn write(&self, document_text: &str, destination: &str) -> Result<(), ExportError> {
        let entry = (destination.to_string(), normalize_line_endings(document_text));
        match self.written.lock() {
            Ok(mut written) => written.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_file_sink_writes_normalized_text() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "out/architecture.md");
        FileSink::new(false)
            .write("# Title\r\n\r\nBody\r\n", path.as_str())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Title\n\nBody\n");
    }

    #[test]
    fn test_file_sink_prefixes_viewing_notes() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "architecture.md");
        FileSink::new(true).write("# Title\n", path.as_str()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!--\nViewing notes"));
        assert!(written.ends_with("# Title\n"));
    }

    #[test]
    fn test_file_sink_rejects_directories() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            FileSink::new(false).write("x", path.as_str()),
            Err(ExportError::InvalidDestination { .. })
        ));
        assert!(matches!(
            FileSink::new(false).write("x", "  "),
            Err(ExportError::InvalidDestination { .. })
        ));
    }

    #[test]
    fn test_memory_sink_records_writes() {
        let sink = MemorySink::new();
        sink.write("a\r\nb", "first").unwrap();
        sink.write("c", "second").unwrap();
        assert_eq!(
            sink.written(),
            vec![
                ("first".to_string(), "a\nb".to_string()),
                ("second".to_string(), "c".to_string())
            ]
        );
    }
}
