use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default file for saved edits
pub const SAVED_EDITS_FILE: &str = "saved_edits.json";

/// Directory holding rotated log files
pub const LOG_DIR: &str = "logs";

/// Registry of known cache files
const CACHE_FILES: &[&str] = &[SAVED_EDITS_FILE];

/// Manages cache directory and cache file operations
#[derive(Clone)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    /// Create a CacheManager with a custom cache directory (primarily for testing)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_file(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    pub fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Ensure the log directory exists and return it
    pub fn ensure_log_dir(&self) -> Result<PathBuf> {
        let dir = self.cache_dir.join(LOG_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Remove registered cache files and the log directory
    pub fn clear_all(&self) -> Result<()> {
        for filename in CACHE_FILES {
            let file_path = self.cache_file(filename);
            if file_path.exists() {
                if let Err(e) = fs::remove_file(&file_path) {
                    warn!("Could not remove cache file {}: {}", filename, e);
                }
            }
        }

        let log_dir = self.cache_dir.join(LOG_DIR);
        if log_dir.exists() {
            fs::remove_dir_all(&log_dir)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clear_all_removes_registered_files() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(dir.path().join("lotedit"));
        cache.ensure_cache_dir().unwrap();
        let saved = cache.cache_file(SAVED_EDITS_FILE);
        fs::write(&saved, "{}").unwrap();
        let other = cache.cache_file("keep.txt");
        fs::write(&other, "x").unwrap();
        let logs = cache.ensure_log_dir().unwrap();
        fs::write(logs.join("lotedit.log"), "line").unwrap();

        cache.clear_all().unwrap();
        assert!(!saved.exists());
        assert!(!logs.exists());
        assert!(other.exists());
    }

    #[test]
    fn test_clear_all_on_missing_dir() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(dir.path().join("absent"));
        assert!(cache.clear_all().is_ok());
    }
}
