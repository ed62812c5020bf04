use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::model::EditedValue;

/// Receives saved edits, one row at a time. Entries were validated when they
/// were committed, so sinks do not re-check them.
pub trait EditSink {
    fn persist(&mut self, edit: EditedValue) -> Result<()>;

    /// Called once after the last `persist`
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// File the edits end up in, if any
    fn destination(&self) -> Option<&Path> {
        None
    }
}

/// Writes each saved edit to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl EditSink for LogSink {
    fn persist(&mut self, edit: EditedValue) -> Result<()> {
        info!(carid = edit.row_id, value = edit.value, "saved edit");
        Ok(())
    }
}

/// Keeps saved edits in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub edits: Vec<EditedValue>,
    pub finished: bool,
}

impl EditSink for MemorySink {
    fn persist(&mut self, edit: EditedValue) -> Result<()> {
        self.edits.push(edit);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// On-disk layout of a saved edits file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEdits {
    pub saved_at: String,
    pub edits: Vec<EditedValue>,
}

impl SavedEdits {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read saved edits at {}: {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| eyre!("Failed to parse saved edits at {}: {}", path.display(), e))
    }
}

/// Collects edits and writes them as one JSON document on `finish`
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    pending: Vec<EditedValue>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
        }
    }
}

impl EditSink for JsonFileSink {
    fn persist(&mut self, edit: EditedValue) -> Result<()> {
        self.pending.push(edit);
        Ok(())
    }

    fn destination(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let document = SavedEdits {
            saved_at: chrono::Local::now().to_rfc3339(),
            edits: std::mem::take(&mut self.pending),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| eyre!("Failed to open {}: {}", self.path.display(), e))?;
        fs2::FileExt::try_lock_exclusive(&file)
            .map_err(|e| eyre!("Could not lock {}: {}", self.path.display(), e))?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs2::FileExt::unlock(&file)?;

        info!(
            path = %self.path.display(),
            count = document.edits.len(),
            "wrote saved edits"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_file_sink_writes_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("edits.json");
        let mut sink = JsonFileSink::new(&path);
        sink.persist(EditedValue::new(1, 1500.0)).unwrap();
        sink.persist(EditedValue::new(5, 0.0)).unwrap();
        sink.finish().unwrap();

        let saved = SavedEdits::read(&path).unwrap();
        assert_eq!(
            saved.edits,
            vec![EditedValue::new(1, 1500.0), EditedValue::new(5, 0.0)]
        );
        assert!(chrono::DateTime::parse_from_rfc3339(&saved.saved_at).is_ok());
    }

    #[test]
    fn test_json_file_sink_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edits.json");

        let mut first = JsonFileSink::new(&path);
        first.persist(EditedValue::new(1, 1.0)).unwrap();
        first.persist(EditedValue::new(2, 2.0)).unwrap();
        first.finish().unwrap();

        let mut second = JsonFileSink::new(&path);
        second.persist(EditedValue::new(3, 3.0)).unwrap();
        second.finish().unwrap();

        let saved = SavedEdits::read(&path).unwrap();
        assert_eq!(saved.edits, vec![EditedValue::new(3, 3.0)]);
    }

    #[test]
    fn test_log_sink_accepts_everything() {
        let mut sink = LogSink;
        assert!(sink.persist(EditedValue::new(0, 42.0)).is_ok());
        assert!(sink.finish().is_ok());
        assert!(sink.destination().is_none());
        assert!(JsonFileSink::new("edits.json").destination().is_some());
    }
}
