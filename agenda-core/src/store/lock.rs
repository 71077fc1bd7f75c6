//! Exclusive lock around local store writes, shared across processes.

use std::fs::{self, File};
use std::path::Path;

use fs2::FileExt;

use super::unavailable;
use crate::error::{AgendaError, AgendaResult};

const LOCK_FILE: &str = ".agenda.lock";

/// A lock guard that releases the lock when dropped
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Block until the data directory's lock is ours.
    pub fn acquire(data_dir: &Path) -> AgendaResult<Self> {
        fs::create_dir_all(data_dir).map_err(|e| unavailable(data_dir, e))?;
        let path = data_dir.join(LOCK_FILE);
        let file = File::create(&path).map_err(|e| unavailable(&path, e))?;

        file.lock_exclusive().map_err(|e| {
            AgendaError::store(
                "local",
                format!("could not lock {}: {}", path.display(), e),
            )
        })?;

        Ok(StoreLock { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
