//! Exclusive access to one state file.
//!
//! Two `catpoint` processes may run side by side as long as they drive
//! different state files. The lock is a Unix socket named after a hash of
//! the canonical store path, so every spelling of the same file maps to the
//! same socket. The OS drops the listener when a process dies; a socket file
//! nobody answers on is replaced.

use log::{debug, warn};
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreLockError {
    #[error("alarm state {} is in use by another catpoint process", path.display())]
    Locked { path: PathBuf },

    #[error("failed to lock alarm state: {0}")]
    Io(#[from] io::Error),
}

/// Held for as long as this process owns the state file.
pub struct StoreLock {
    _listener: UnixListener,
    socket: PathBuf,
    store: PathBuf,
}

impl StoreLock {
    /// Lock `store_path`, placing the socket under `XDG_RUNTIME_DIR` or `/tmp`.
    pub fn acquire(store_path: &Path) -> Result<Self, StoreLockError> {
        let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::acquire_in(&runtime_dir, store_path)
    }

    /// Lock `store_path` with the socket placed in `runtime_dir`.
    pub fn acquire_in(runtime_dir: &Path, store_path: &Path) -> Result<Self, StoreLockError> {
        let store = canonical_store_path(store_path)?;
        let socket = runtime_dir.join(socket_name(&store));

        if socket.exists() {
            if UnixStream::connect(&socket).is_ok() {
                return Err(StoreLockError::Locked { path: store });
            }
            warn!("Replacing stale lock {:?}", socket);
            std::fs::remove_file(&socket)?;
        }

        match UnixListener::bind(&socket) {
            Ok(listener) => {
                debug!("Locked {:?} via {:?}", store, socket);
                Ok(Self {
                    _listener: listener,
                    socket,
                    store,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                Err(StoreLockError::Locked { path: store })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Canonical path of the locked state file.
    pub fn store_path(&self) -> &Path {
        &self.store
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket) {
            debug!("Failed to remove lock {:?}: {}", self.socket, e);
        }
    }
}

/// Resolve symlinks and relative components. The state file itself may not
/// exist yet, in which case its parent directory is resolved instead.
fn canonical_store_path(path: &Path) -> io::Result<PathBuf> {
    if let Ok(path) = path.canonicalize() {
        return Ok(path);
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(parent) = parent_or_cwd(parent).canonicalize()
    {
        return Ok(parent.join(name));
    }
    std::path::absolute(path)
}

fn parent_or_cwd(parent: &Path) -> &Path {
    if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    }
}

fn socket_name(store: &Path) -> String {
    let hash = blake3::hash(store.as_os_str().as_encoded_bytes());
    format!("catpoint-{}.sock", &hash.to_hex()[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_name_depends_on_store() {
        let a = socket_name(Path::new("/var/lib/catpoint/home.json"));
        let b = socket_name(Path::new("/var/lib/catpoint/office.json"));
        assert_ne!(a, b);
        assert!(a.starts_with("catpoint-") && a.ends_with(".sock"));
        assert_eq!(a, socket_name(Path::new("/var/lib/catpoint/home.json")));
    }

    #[test]
    fn test_different_stores_lock_independently() {
        let runtime = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();

        let home = StoreLock::acquire_in(runtime.path(), &data.path().join("home.json")).unwrap();
        let office =
            StoreLock::acquire_in(runtime.path(), &data.path().join("office.json")).unwrap();

        assert_ne!(home.socket_path(), office.socket_path());
    }

    #[test]
    fn test_same_store_spelled_differently_conflicts() {
        let runtime = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        std::fs::create_dir(data.path().join("sub")).unwrap();

        let lock = StoreLock::acquire_in(runtime.path(), &data.path().join("state.json")).unwrap();
        let other_spelling = data.path().join("sub").join("..").join("state.json");

        match StoreLock::acquire_in(runtime.path(), &other_spelling) {
            Err(StoreLockError::Locked { path }) => assert_eq!(path, lock.store_path()),
            other => panic!("expected Locked, got {:?}", other.map(|l| l.socket.clone())),
        }
    }

    #[test]
    fn test_existing_store_file_conflicts_with_missing_spelling() {
        let runtime = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let store = data.path().join("state.json");

        let _lock = StoreLock::acquire_in(runtime.path(), &store).unwrap();
        std::fs::write(&store, b"{}").unwrap();

        assert!(matches!(
            StoreLock::acquire_in(runtime.path(), &store),
            Err(StoreLockError::Locked { .. })
        ));
    }

    #[test]
    fn test_drop_releases_lock() {
        let runtime = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let store = data.path().join("state.json");

        let lock = StoreLock::acquire_in(runtime.path(), &store).unwrap();
        let socket = lock.socket_path().to_path_buf();
        drop(lock);

        assert!(!socket.exists());
        assert!(StoreLock::acquire_in(runtime.path(), &store).is_ok());
    }

    #[test]
    fn test_stale_socket_file_is_replaced() {
        let runtime = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let store = data.path().join("state.json");
        let stale = runtime
            .path()
            .join(socket_name(&canonical_store_path(&store).unwrap()));
        std::fs::write(&stale, b"").unwrap();

        let lock = StoreLock::acquire_in(runtime.path(), &store).unwrap();
        assert_eq!(lock.socket_path(), stale.as_path());
    }
}
