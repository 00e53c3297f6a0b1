use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::command::HistoryRecord;
use crate::util::time;

/// Errors that can occur during session persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize state: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to write state: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to read state file: {0}")]
    ReadError(String),

    #[error("Invalid state data: {0}")]
    InvalidState(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable storage for the current drawing and its history within one
/// application run.
///
/// The engine treats every call as best effort: failures are logged and the
/// in-memory state carries on.
pub trait SessionStore: Send + Sync {
    fn read_scene_snapshot(&self) -> PersistenceResult<Option<String>>;

    fn write_scene_snapshot(&self, snapshot: &str) -> PersistenceResult<()>;

    fn read_history(&self) -> PersistenceResult<Option<HistoryRecord>>;

    fn write_history(&self, record: &HistoryRecord) -> PersistenceResult<()>;

    /// True exactly once per process lifetime.
    fn take_fresh_process_start(&self) -> bool;

    /// Forget the stored snapshot and history
    fn clear(&self) -> PersistenceResult<()>;
}

/// Session store kept in memory, shared between canvas instances of one run.
#[derive(Debug)]
pub struct MemorySessionStore {
    snapshot: Mutex<Option<String>>,
    history: Mutex<Option<HistoryRecord>>,
    fresh: AtomicBool,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self {
            snapshot: Mutex::new(None),
            history: Mutex::new(None),
            fresh: AtomicBool::new(true),
        }
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn read_scene_snapshot(&self) -> PersistenceResult<Option<String>> {
        Ok(self.snapshot.lock().clone())
    }

    fn write_scene_snapshot(&self, snapshot: &str) -> PersistenceResult<()> {
        *self.snapshot.lock() = Some(snapshot.to_owned());
        Ok(())
    }

    fn read_history(&self) -> PersistenceResult<Option<HistoryRecord>> {
        Ok(self.history.lock().clone())
    }

    fn write_history(&self, record: &HistoryRecord) -> PersistenceResult<()> {
        *self.history.lock() = Some(record.clone());
        Ok(())
    }

    fn take_fresh_process_start(&self) -> bool {
        self.fresh.swap(false, Ordering::SeqCst)
    }

    fn clear(&self) -> PersistenceResult<()> {
        *self.snapshot.lock() = None;
        *self.history.lock() = None;
        Ok(())
    }
}

static FILE_STORE_FRESH: AtomicBool = AtomicBool::new(true);

const SNAPSHOT_FILE: &str = "scene.json";
const HISTORY_FILE: &str = "history.json";

#[derive(Serialize, Deserialize)]
struct StoredHistory {
    record: HistoryRecord,
    /// Seconds since the UNIX epoch at write time
    timestamp: u64,
    version: String,
}

/// Session store writing JSON files into a directory.
///
/// Files outlive the process; the fresh-start flag is process-wide so the
/// first store opened in a run discards whatever a previous run left behind.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_optional(&self, name: &str) -> PersistenceResult<Option<String>> {
        let path = self.path(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::ReadError(format!("{}: {e}", path.display()))),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PersistenceResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(name), contents)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn read_scene_snapshot(&self) -> PersistenceResult<Option<String>> {
        self.read_optional(SNAPSHOT_FILE)
    }

    fn write_scene_snapshot(&self, snapshot: &str) -> PersistenceResult<()> {
        self.write(SNAPSHOT_FILE, snapshot)
    }

    fn read_history(&self) -> PersistenceResult<Option<HistoryRecord>> {
        let Some(json) = self.read_optional(HISTORY_FILE)? else {
            return Ok(None);
        };
        let stored: StoredHistory = serde_json::from_str(&json)?;
        if stored.version != env!("CARGO_PKG_VERSION") {
            warn!(
                "Session history version {} differs from current version {}",
                stored.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        if stored.record.index >= stored.record.entries.len() {
            return Err(PersistenceError::InvalidState(format!(
                "history index {} out of range for {} entries",
                stored.record.index,
                stored.record.entries.len()
            )));
        }
        Ok(Some(stored.record))
    }

    fn write_history(&self, record: &HistoryRecord) -> PersistenceResult<()> {
        let stored = StoredHistory {
            record: record.clone(),
            timestamp: time::timestamp_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        self.write(HISTORY_FILE, &serde_json::to_string(&stored)?)
    }

    fn take_fresh_process_start(&self) -> bool {
        FILE_STORE_FRESH.swap(false, Ordering::SeqCst)
    }

    fn clear(&self) -> PersistenceResult<()> {
        for name in [SNAPSHOT_FILE, HISTORY_FILE] {
            match fs::remove_file(self.path(name)) {
                Ok(()) => debug!("Removed session file {name}"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
