//! # File I/O Module
//!
//! The durable slot the store is persisted to, with safety features:
//! - **Atomic saves**: Write to `.tmp`, sync, rename over the state file, so a
//!   failed write never damages the previously saved state
//! - **Single writer**: An exclusive OS lock (fs2) on a `.lock` file, which
//!   also records who holds it
//!
//! ## Example
//!
//! ```rust,no_run
//! use revest_core::config::StoreConfig;
//! use revest_core::file_io::{FileSlot, StateSlot};
//!
//! let config = StoreConfig::resolve(None);
//! let mut slot = FileSlot::open(&config, "jane")?;
//!
//! slot.write(r#"{"projects":[]}"#)?;
//! assert!(slot.read()?.is_some());
//!
//! // Lock is released when the slot is dropped
//! drop(slot);
//! # Ok::<(), revest_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::errors::{CalcError, CalcResult};

/// A single durable location holding the serialized store.
pub trait StateSlot {
    /// Read the stored record, `None` if nothing was ever written.
    fn read(&self) -> CalcResult<Option<String>>;

    /// Replace the stored record. On failure the previous record is intact.
    fn write(&mut self, contents: &str) -> CalcResult<()>;
}

/// In-process slot, for tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySlot {
    contents: Option<String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        MemorySlot::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        MemorySlot {
            contents: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl StateSlot for MemorySlot {
    fn read(&self) -> CalcResult<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> CalcResult<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}

/// Slot backed by a JSON file, locked for the lifetime of the value.
pub struct FileSlot {
    path: PathBuf,
    lock: FileLock,
}

impl FileSlot {
    /// Create the data directory if needed and lock the state file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileSlot)` - Slot opened and locked
    /// * `Err(CalcError::FileLocked)` - Another process holds the lock
    /// * `Err(CalcError::FileError)` - The directory could not be created
    pub fn open(config: &StoreConfig, user_id: impl Into<String>) -> CalcResult<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            CalcError::file_error("create data dir", config.data_dir.display().to_string(), e.to_string())
        })?;
        let path = config.state_path();
        let lock = FileLock::acquire(&path, user_id)?;
        info!("opened state file {}", path.display());
        Ok(FileSlot { path, lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata written by this process into the lock file
    pub fn lock_info(&self) -> &LockInfo {
        &self.lock.info
    }
}

impl StateSlot for FileSlot {
    fn read(&self) -> CalcResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CalcError::file_error(
                "read",
                self.path.display().to_string(),
                e.to_string(),
            )),
        }
    }

    fn write(&mut self, contents: &str) -> CalcResult<()> {
        atomic_write(&self.path, contents)
    }
}

/// Lock file metadata stored in `.lock` files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (login name)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

/// Get the hostname of the current machine
fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock guard that releases the lock when dropped.
///
/// The OS-level lock (fs2) is authoritative: the OS drops it when the holder
/// exits, so a lock file left behind by a crashed process is simply taken
/// over. The JSON metadata inside is only used to report who holds it.
pub struct FileLock {
    /// Path to the lock file
    lock_path: PathBuf,
    /// The underlying file handle (keeps OS lock)
    _lock_file: File,
    /// Lock metadata
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a state file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(CalcError::FileLocked)` - Another process (or another slot in
    ///   this process) holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = path_with_suffix(path, "lock");
        let info = LockInfo::new(user_id);

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(match read_lock_info(&lock_path) {
                Ok(holder) => CalcError::file_locked(
                    path.display().to_string(),
                    format!("{} ({}, pid {})", holder.user_id, holder.machine, holder.pid),
                    holder.locked_at.to_rfc3339(),
                ),
                Err(_) => CalcError::file_locked(path.display().to_string(), "another process", "unknown"),
            });
        }

        if let Ok(previous) = read_lock_info(&lock_path) {
            warn!(
                "taking over stale lock left by {} (pid {})",
                previous.user_id, previous.pid
            );
        }

        // Write lock info to the file using the same handle
        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file.set_len(0).map_err(|e| {
            CalcError::file_error("truncate lock", lock_path.display().to_string(), e.to_string())
        })?;
        lock_file.write_all(lock_json.as_bytes()).map_err(|e| {
            CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string())
        })?;
        lock_file.sync_all().map_err(|e| {
            CalcError::file_error("sync lock", lock_path.display().to_string(), e.to_string())
        })?;

        Ok(FileLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Report who holds the lock on `path` without acquiring it.
    ///
    /// Returns `Some(LockInfo)` if locked, `None` if available.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = path_with_suffix(path, "lock");
        let file = OpenOptions::new().read(true).open(&lock_path).ok()?;
        if file.try_lock_shared().is_ok() {
            let _ = FileExt::unlock(&file);
            return None;
        }
        read_lock_info(&lock_path).ok()
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Remove the lock file; the OS lock goes with the handle
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `state.json` + `lock` -> `state.json.lock`
fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut out = path.to_path_buf();
    let extension = out
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    out.set_extension(extension);
    out
}

/// Read lock info from a lock file
fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let mut file = File::open(lock_path).map_err(|e| {
        CalcError::file_error("read lock", lock_path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        CalcError::file_error("read lock", lock_path.display().to_string(), e.to_string())
    })?;

    Ok(serde_json::from_str(&contents)?)
}

/// Write `contents` to `path` with atomic replace semantics.
///
/// The save process:
/// 1. Write to a temporary sibling (`.tmp`)
/// 2. Sync to disk (fsync)
/// 3. Rename over the target (atomic on most filesystems)
pub fn atomic_write(path: &Path, contents: &str) -> CalcResult<()> {
    let tmp_path = path_with_suffix(path, "tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(contents.as_bytes()).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        // Clean up temp file if rename fails
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> StoreConfig {
        StoreConfig::new(dir.path())
    }

    #[test]
    fn test_suffix_path_generation() {
        let path = Path::new("/path/to/revestmaster_state.json");
        assert_eq!(
            path_with_suffix(path, "lock"),
            Path::new("/path/to/revestmaster_state.json.lock")
        );
        assert_eq!(path_with_suffix(Path::new("/path/state"), "tmp"), Path::new("/path/state.tmp"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("tester");
        assert_eq!(info.user_id, "tester");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_memory_slot() {
        let mut slot = MemorySlot::new();
        assert_eq!(slot.read().unwrap(), None);
        slot.write("{}").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("{}"));
        assert_eq!(slot.contents(), Some("{}"));
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::open(&test_config(&dir), "tester").unwrap();
        assert_eq!(slot.read().unwrap(), None);
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut slot = FileSlot::open(&test_config(&dir), "tester").unwrap();
        slot.write(r#"{"projects":[]}"#).unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some(r#"{"projects":[]}"#));
    }

    #[test]
    fn test_atomic_write_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();

        assert!(!path_with_suffix(&path, "tmp").exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_failed_write_keeps_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        atomic_write(&path, "kept").unwrap();

        // A directory where the temp file should go makes the write fail
        fs::create_dir(path_with_suffix(&path, "tmp")).unwrap();
        assert!(atomic_write(&path, "lost").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
    }

    #[test]
    fn test_second_slot_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let first = FileSlot::open(&config, "alice").unwrap();

        let err = FileSlot::open(&config, "bob").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert!(err.to_string().contains("alice"));

        let holder = FileLock::check(first.path()).unwrap();
        assert_eq!(holder.user_id, "alice");

        drop(first);
        assert!(FileLock::check(&config.state_path()).is_none());
        assert!(FileSlot::open(&config, "bob").is_ok());
    }

    #[test]
    fn test_leftover_lock_file_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let lock_path = path_with_suffix(&config.state_path(), "lock");
        fs::write(&lock_path, serde_json::to_string(&LockInfo::new("crashed")).unwrap()).unwrap();

        let slot = FileSlot::open(&config, "tester").unwrap();
        assert_eq!(slot.lock_info().user_id, "tester");
        assert_eq!(read_lock_info(&lock_path).unwrap().user_id, "tester");
    }

    #[test]
    fn test_lock_file_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let lock_path = path_with_suffix(&config.state_path(), "lock");

        let slot = FileSlot::open(&config, "tester").unwrap();
        assert!(lock_path.exists());
        drop(slot);
        assert!(!lock_path.exists());
    }
}
