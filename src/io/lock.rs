use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lock file kept at the vault root. It is created once and never
/// removed: unlinking it would let a waiter and a fresh acquirer flock
/// two different inodes under the same name.
const LOCK_FILE: &str = ".lane.lock";

const RETRY_INTERVAL: Duration = Duration::from_millis(20);
const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Advisory writer lock on a vault, serializing document rewrites
/// between lane processes (a watcher and a CLI invocation, say).
///
/// Holding the value is holding the lock; the flock releases with the
/// file descriptor when the value drops.
pub struct VaultLock {
    _file: std::fs::File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("vault is locked by another lane process ({path})")]
    Busy { path: PathBuf },
    #[error("lock on {path} failed: {source}")]
    Flock {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl VaultLock {
    /// Take the vault lock, waiting up to `wait` while another process
    /// holds it. A busy lock retries; a real flock failure does not.
    pub fn acquire(vault_root: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = vault_root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + wait;
        loop {
            match try_flock(&file) {
                Ok(true) => return Ok(VaultLock { _file: file }),
                Ok(false) if Instant::now() >= deadline => {
                    return Err(LockError::Busy { path });
                }
                Ok(false) => std::thread::sleep(RETRY_INTERVAL),
                Err(source) => return Err(LockError::Flock { path, source }),
            }
        }
    }

    pub fn acquire_default(vault_root: &Path) -> Result<Self, LockError> {
        Self::acquire(vault_root, DEFAULT_WAIT)
    }
}

/// One non-blocking exclusive flock attempt. `Ok(false)` means some
/// other descriptor holds the lock; anything else errors out.
#[cfg(unix)]
fn try_flock(file: &std::fs::File) -> Result<bool, std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EWOULDBLOCK) => Ok(false),
        _ => Err(err),
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &std::fs::File) -> Result<bool, std::io::Error> {
    // No advisory locking off Unix; single-process behavior is unchanged
    Ok(true)
}
