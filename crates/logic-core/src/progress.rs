//! Unlock progress: the highest level a player may open.
//!
//! Progress only ever grows. Recording a lower level than the current
//! value leaves it untouched, so concurrent or out-of-order successes can
//! never lock a player out of a level they already reached.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Highest unlocked level for a new player.
pub const FIRST_LEVEL: u32 = 1;

/// Errors from persistent progress stores.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Reading or writing the progress file failed.
    #[error("progress file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The progress file is not valid JSON.
    #[error("progress file is malformed: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Storage for the monotonic unlock value.
pub trait ProgressStore: Send + Sync {
    /// The highest level the player may open.
    fn highest_unlocked(&self) -> u32;

    /// Raise the unlock value to at least `level` and return the result.
    fn record_unlock(&self, level: u32) -> Result<u32, ProgressError>;

    /// Whether `level` may be opened.
    fn is_unlocked(&self, level: u32) -> bool {
        level <= self.highest_unlocked()
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Progress held in memory only.
#[derive(Debug)]
pub struct MemoryProgressStore {
    highest: AtomicU32,
}

impl MemoryProgressStore {
    /// Start at [`FIRST_LEVEL`].
    pub const fn new() -> Self {
        Self::with_highest(FIRST_LEVEL)
    }

    /// Start at a given value (never below [`FIRST_LEVEL`]).
    pub const fn with_highest(highest: u32) -> Self {
        let highest = if highest < FIRST_LEVEL {
            FIRST_LEVEL
        } else {
            highest
        };
        Self {
            highest: AtomicU32::new(highest),
        }
    }
}

impl Default for MemoryProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn highest_unlocked(&self) -> u32 {
        self.highest.load(Ordering::Acquire)
    }

    fn record_unlock(&self, level: u32) -> Result<u32, ProgressError> {
        let previous = self.highest.fetch_max(level, Ordering::AcqRel);
        Ok(previous.max(level))
    }
}

// ---------------------------------------------------------------------------
// File-backed
// ---------------------------------------------------------------------------

/// On-disk JSON shape.
#[derive(Debug, Serialize, Deserialize)]
struct ProgressFile {
    highest_unlocked: u32,
    updated_at: DateTime<Utc>,
}

/// Progress persisted to a small JSON file.
///
/// Writes go to a sibling temporary file, are synced, and are renamed into
/// place, so a crash mid-write leaves the previous value intact. The
/// in-memory value is raised only after the file holds it.
#[derive(Debug)]
pub struct FileProgressStore {
    path: PathBuf,
    highest: AtomicU32,
    write_lock: Mutex<()>,
}

impl FileProgressStore {
    /// Open the store at `path`. A missing file means a new player.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError`] if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        let path = path.into();
        let highest = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let file: ProgressFile = serde_json::from_str(&contents)?;
                file.highest_unlocked.max(FIRST_LEVEL)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FIRST_LEVEL,
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), highest_unlocked = highest, "Progress loaded");
        Ok(Self {
            path,
            highest: AtomicU32::new(highest),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the progress file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `highest` to disk. Callers hold `write_lock`.
    fn persist(&self, highest: u32) -> Result<(), ProgressError> {
        let body = serde_json::to_string_pretty(&ProgressFile {
            highest_unlocked: highest,
            updated_at: Utc::now(),
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), highest_unlocked = highest, "Progress saved");
        Ok(())
    }
}

impl ProgressStore for FileProgressStore {
    fn highest_unlocked(&self) -> u32 {
        self.highest.load(Ordering::Acquire)
    }

    fn record_unlock(&self, level: u32) -> Result<u32, ProgressError> {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = self.highest.load(Ordering::Acquire);
        if level <= current {
            return Ok(current);
        }
        self.persist(level)?;
        self.highest.store(level, Ordering::Release);
        Ok(level)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_at_first_level() {
        let store = MemoryProgressStore::new();
        assert_eq!(store.highest_unlocked(), 1);
        assert!(store.is_unlocked(1));
        assert!(!store.is_unlocked(2));
        assert_eq!(MemoryProgressStore::with_highest(0).highest_unlocked(), 1);
    }

    #[test]
    fn memory_store_is_monotonic() {
        let store = MemoryProgressStore::new();
        assert_eq!(store.record_unlock(5).unwrap(), 5);
        assert_eq!(store.record_unlock(3).unwrap(), 5);
        assert_eq!(store.highest_unlocked(), 5);
        assert_eq!(store.record_unlock(6).unwrap(), 6);
    }

    #[test]
    fn file_store_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProgressStore::open(dir.path().join("progress.json")).unwrap();
        assert_eq!(store.highest_unlocked(), FIRST_LEVEL);
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.json");

        let store = FileProgressStore::open(&path).unwrap();
        assert_eq!(store.record_unlock(4).unwrap(), 4);
        assert_eq!(store.record_unlock(2).unwrap(), 4);
        drop(store);

        let reopened = FileProgressStore::open(&path).unwrap();
        assert_eq!(reopened.highest_unlocked(), 4);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["highest_unlocked"], 4);
        assert!(raw["updated_at"].is_string());
    }

    #[test]
    fn failed_write_is_retried_on_the_next_unlock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let store = FileProgressStore::open(&path).unwrap();

        // A directory where the temp file goes makes the write fail.
        let blocker = path.with_extension("json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        assert!(matches!(
            store.record_unlock(5),
            Err(ProgressError::Io { .. })
        ));
        assert_eq!(store.highest_unlocked(), FIRST_LEVEL);
        assert!(!store.is_unlocked(5));

        std::fs::remove_dir(&blocker).unwrap();
        assert_eq!(store.record_unlock(5).unwrap(), 5);
        assert_eq!(store.highest_unlocked(), 5);
        drop(store);

        let reopened = FileProgressStore::open(&path).unwrap();
        assert_eq!(reopened.highest_unlocked(), 5);
        assert!(!blocker.exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileProgressStore::open(&path),
            Err(ProgressError::Json { .. })
        ));
    }
}
