use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Exclusive advisory lock held for the duration of one run, so overlapping
/// scheduled invocations cannot interleave writes and git operations.
///
/// The lock lives on the open file, not on its existence: the OS releases it
/// when the holder exits, crashed or not, so a leftover file never blocks a
/// later run and nothing has to be reclaimed.
#[derive(Debug)]
pub struct RunLock {
    // Held for its lock; released on drop.
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to take the lock. Returns `Ok(None)` when another run holds it.
    pub fn acquire(path: &Path) -> Result<Option<RunLock>> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Ok(None),
            Err(TryLockError::Error(e)) => {
                return Err(e).with_context(|| format!("Failed to lock {}", path.display()))
            }
        }

        // The pid is informational only; a failure to record it does not
        // weaken the lock.
        if let Err(e) = file
            .set_len(0)
            .and_then(|_| writeln!(file, "{}", std::process::id()))
        {
            warn!("Failed to record pid in run lock {}: {}", path.display(), e);
        }
        debug!("Acquired run lock {}", path.display());
        Ok(Some(RunLock {
            _file: file,
            path: path.to_path_buf(),
        }))
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // The file stays; removing it would let a waiting run lock a
        // different inode than a third one.
        debug!("Released run lock {}", self.path.display());
    }
}
