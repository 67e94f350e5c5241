use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::io::lock::{LockError, VaultLock};

/// Settings file that marks a directory as a vault root.
pub const SETTINGS_FILE: &str = "lane.toml";

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("not a lane vault: no lane.toml found")]
    NotAVault,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Lock(#[from] LockError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A vault change as observers see it. Paths are vault-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Changed(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

/// Token returned by [`Vault::subscribe`]; unsubscribing takes it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u64);

/// The document store: a directory tree of markdown files rooted at the
/// settings file, plus the observer registry for change notification.
pub struct Vault {
    root: PathBuf,
    next_handle: u64,
    observers: Vec<(u64, Box<dyn FnMut(&VaultEvent)>)>,
}

/// Find the vault root by walking up from `start` until a directory
/// holding `lane.toml` appears.
pub fn discover_vault(start: &Path) -> Result<PathBuf, VaultError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(SETTINGS_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(VaultError::NotAVault);
        }
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Vault {
    /// Open the vault rooted at `root`. The settings file must already
    /// exist there; `init` creates it.
    pub fn open(root: &Path) -> Result<Self, VaultError> {
        if !root.join(SETTINGS_FILE).is_file() {
            return Err(VaultError::NotAVault);
        }
        Ok(Vault {
            root: root.to_path_buf(),
            next_handle: 0,
            observers: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn abs_path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Every markdown document in the vault as sorted vault-relative
    /// paths. Dot-entries are invisible; `exclude` drops whole subtrees
    /// by relative path prefix.
    pub fn list_documents(&self, exclude: &[String]) -> Result<Vec<PathBuf>, VaultError> {
        let mut found = Vec::new();
        self.walk(&self.root, exclude, &mut found)?;
        found.sort();
        Ok(found)
    }

    fn walk(
        &self,
        dir: &Path,
        exclude: &[String],
        found: &mut Vec<PathBuf>,
    ) -> Result<(), VaultError> {
        let entries = fs::read_dir(dir).map_err(|e| VaultError::ReadError {
            path: dir.to_path_buf(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let rel = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
            if exclude.iter().any(|prefix| rel.starts_with(prefix)) {
                continue;
            }
            if path.is_dir() {
                self.walk(&path, exclude, found)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
                found.push(rel);
            }
        }
        Ok(())
    }

    pub fn read_document(&self, rel: &Path) -> Result<String, VaultError> {
        let path = self.abs_path(rel);
        fs::read_to_string(&path).map_err(|e| VaultError::ReadError { path, source: e })
    }

    /// Read-modify-write one line of a document, atomically and under
    /// the vault lock.
    ///
    /// Returns `Ok(false)` without writing when the document is gone,
    /// the line index is out of range, or `edit` returns the line
    /// unchanged. A trailing newline is preserved as found.
    pub fn rewrite_line(
        &self,
        rel: &Path,
        index: usize,
        edit: impl FnOnce(&str) -> String,
    ) -> Result<bool, VaultError> {
        let path = self.abs_path(rel);
        let _lock = VaultLock::acquire_default(&self.root)?;

        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(VaultError::ReadError { path, source: e }),
        };

        let lines: Vec<&str> = text.lines().collect();
        let Some(current) = lines.get(index) else {
            return Ok(false);
        };
        let replacement = edit(current);
        if replacement == *current {
            return Ok(false);
        }

        let mut out = String::with_capacity(text.len() + replacement.len());
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if i == index {
                out.push_str(&replacement);
            } else {
                out.push_str(line);
            }
        }
        if text.ends_with('\n') {
            out.push('\n');
        }
        atomic_write(&path, out.as_bytes())?;
        Ok(true)
    }

    // ── observer registry ───────────────────────────────────────────

    /// Register an observer. Observers run synchronously, in
    /// subscription order, on the thread that publishes.
    pub fn subscribe(&mut self, observer: Box<dyn FnMut(&VaultEvent)>) -> SubscriberHandle {
        let handle = SubscriberHandle(self.next_handle);
        self.next_handle += 1;
        self.observers.push((handle.0, observer));
        handle
    }

    /// Remove one observer by its handle. Unknown handles are ignored.
    pub fn unsubscribe(&mut self, handle: SubscriberHandle) {
        self.observers.retain(|(id, _)| *id != handle.0);
    }

    /// Deliver `event` to every registered observer.
    pub fn publish(&mut self, event: &VaultEvent) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn vault_in(tmp: &TempDir) -> Vault {
        fs::write(tmp.path().join(SETTINGS_FILE), "").unwrap();
        Vault::open(tmp.path()).unwrap()
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SETTINGS_FILE), "").unwrap();
        let nested = tmp.path().join("notes/deep");
        fs::create_dir_all(&nested).unwrap();

        let root = discover_vault(&nested).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn test_discover_fails_outside_a_vault() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover_vault(tmp.path()),
            Err(VaultError::NotAVault)
        ));
    }

    #[test]
    fn test_open_requires_settings_file() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(Vault::open(tmp.path()), Err(VaultError::NotAVault)));
    }

    #[test]
    fn test_list_documents_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let vault = vault_in(&tmp);
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        fs::create_dir_all(tmp.path().join("archive")).unwrap();
        fs::write(tmp.path().join("b.md"), "").unwrap();
        fs::write(tmp.path().join("a.md"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::write(tmp.path().join(".draft.md"), "").unwrap();
        fs::write(tmp.path().join("sub/c.md"), "").unwrap();
        fs::write(tmp.path().join("archive/old.md"), "").unwrap();

        let docs = vault.list_documents(&["archive".to_string()]).unwrap();
        assert_eq!(
            docs,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b.md"),
                PathBuf::from("sub/c.md"),
            ]
        );
    }

    #[test]
    fn test_exclude_prefix_is_component_wise() {
        let tmp = TempDir::new().unwrap();
        let vault = vault_in(&tmp);
        fs::create_dir_all(tmp.path().join("archive")).unwrap();
        fs::write(tmp.path().join("archive/x.md"), "").unwrap();
        fs::write(tmp.path().join("archived.md"), "").unwrap();

        let docs = vault.list_documents(&["archive".to_string()]).unwrap();
        assert_eq!(docs, vec![PathBuf::from("archived.md")]);
    }

    #[test]
    fn test_rewrite_line_replaces_one_line() {
        let tmp = TempDir::new().unwrap();
        let vault = vault_in(&tmp);
        fs::write(tmp.path().join("doc.md"), "alpha\nbeta\ngamma\n").unwrap();

        let changed = vault
            .rewrite_line(Path::new("doc.md"), 1, |line| format!("{}!", line))
            .unwrap();
        assert!(changed);
        assert_eq!(
            fs::read_to_string(tmp.path().join("doc.md")).unwrap(),
            "alpha\nbeta!\ngamma\n"
        );
    }

    #[test]
    fn test_rewrite_line_preserves_missing_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let vault = vault_in(&tmp);
        fs::write(tmp.path().join("doc.md"), "alpha\nbeta").unwrap();

        vault
            .rewrite_line(Path::new("doc.md"), 0, |_| "first".to_string())
            .unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("doc.md")).unwrap(),
            "first\nbeta"
        );
    }

    #[test]
    fn test_rewrite_line_noops() {
        let tmp = TempDir::new().unwrap();
        let vault = vault_in(&tmp);
        fs::write(tmp.path().join("doc.md"), "alpha\n").unwrap();

        // out-of-range index
        let changed = vault
            .rewrite_line(Path::new("doc.md"), 5, |_| "x".to_string())
            .unwrap();
        assert!(!changed);

        // edit returns the line unchanged
        let changed = vault
            .rewrite_line(Path::new("doc.md"), 0, |line| line.to_string())
            .unwrap();
        assert!(!changed);

        // document is gone
        let changed = vault
            .rewrite_line(Path::new("ghost.md"), 0, |_| "x".to_string())
            .unwrap();
        assert!(!changed);

        assert_eq!(
            fs::read_to_string(tmp.path().join("doc.md")).unwrap(),
            "alpha\n"
        );
    }

    #[test]
    fn test_observers_receive_events_until_unsubscribed() {
        let tmp = TempDir::new().unwrap();
        let mut vault = vault_in(&tmp);

        let seen: Rc<RefCell<Vec<VaultEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handle = vault.subscribe(Box::new(move |event| {
            sink.borrow_mut().push(event.clone());
        }));

        vault.publish(&VaultEvent::Changed(PathBuf::from("a.md")));
        vault.unsubscribe(handle);
        vault.publish(&VaultEvent::Deleted(PathBuf::from("a.md")));

        assert_eq!(
            *seen.borrow(),
            vec![VaultEvent::Changed(PathBuf::from("a.md"))]
        );
    }

    #[test]
    fn test_unsubscribe_is_handle_specific() {
        let tmp = TempDir::new().unwrap();
        let mut vault = vault_in(&tmp);

        let first_count = Rc::new(RefCell::new(0));
        let second_count = Rc::new(RefCell::new(0));
        let sink = first_count.clone();
        let first = vault.subscribe(Box::new(move |_| *sink.borrow_mut() += 1));
        let sink = second_count.clone();
        let _second = vault.subscribe(Box::new(move |_| *sink.borrow_mut() += 1));

        vault.unsubscribe(first);
        vault.publish(&VaultEvent::Changed(PathBuf::from("a.md")));

        assert_eq!(*first_count.borrow(), 0);
        assert_eq!(*second_count.borrow(), 1);
    }
}
