use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::vault::SETTINGS_FILE;

/// Events sent from the file watcher to the event loop. Paths are
/// vault-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// One or more tracked files changed on disk.
    Changed(Vec<PathBuf>),
    /// Tracked files disappeared.
    Removed(Vec<PathBuf>),
    /// A tracked file moved within the vault.
    Renamed { from: PathBuf, to: PathBuf },
}

/// A file system watcher over the vault tree.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl VaultWatcher {
    /// Start watching the vault root recursively.
    /// Returns a `VaultWatcher` whose `poll()` method should be called each tick.
    pub fn start(vault_root: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let root = vault_root.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };
                if let Some(file_event) = translate(&root, &event) {
                    let _ = tx.send(file_event);
                }
            },
            Config::default(),
        )?;

        watcher.watch(vault_root, RecursiveMode::Recursive)?;
        Ok(VaultWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending file events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

/// Map one notify event onto the vault's vocabulary. Returns `None`
/// when nothing the board tracks is involved.
fn translate(root: &Path, event: &Event) -> Option<FileEvent> {
    let relevant: Vec<PathBuf> = event
        .paths
        .iter()
        .filter_map(|p| relative(root, p))
        .collect();

    match event.kind {
        // A two-path rename pairs up; a rename that crosses the vault
        // boundary degrades to a plain change or removal.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            let from = relative(root, &event.paths[0]);
            let to = relative(root, &event.paths[1]);
            match (from, to) {
                (Some(from), Some(to)) => Some(FileEvent::Renamed { from, to }),
                (Some(from), None) => Some(FileEvent::Removed(vec![from])),
                (None, Some(to)) => Some(FileEvent::Changed(vec![to])),
                (None, None) => None,
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
            if relevant.is_empty() {
                None
            } else {
                Some(FileEvent::Removed(relevant))
            }
        }
        EventKind::Create(_) | EventKind::Modify(_) => {
            if relevant.is_empty() {
                None
            } else {
                Some(FileEvent::Changed(relevant))
            }
        }
        _ => None,
    }
}

/// A path the board tracks: a visible `.md` document inside the vault,
/// or the settings file. Returns its vault-relative form.
fn relative(root: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    let hidden = rel
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
    if hidden {
        return None;
    }
    if rel == Path::new(SETTINGS_FILE)
        || path.extension().and_then(|e| e.to_str()) == Some("md")
    {
        return Some(rel.to_path_buf());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    fn root() -> PathBuf {
        PathBuf::from("/vault")
    }

    fn change(path: &str) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from(path))
    }

    #[test]
    fn test_translate_data_change() {
        let event = change("/vault/notes/a.md");
        assert_eq!(
            translate(&root(), &event),
            Some(FileEvent::Changed(vec![PathBuf::from("notes/a.md")]))
        );
    }

    #[test]
    fn test_translate_settings_change() {
        let event = change("/vault/lane.toml");
        assert_eq!(
            translate(&root(), &event),
            Some(FileEvent::Changed(vec![PathBuf::from("lane.toml")]))
        );
    }

    #[test]
    fn test_translate_ignores_foreign_files() {
        // wrong extension, hidden files, outside the vault
        assert_eq!(translate(&root(), &change("/vault/notes.txt")), None);
        assert_eq!(translate(&root(), &change("/vault/.lane.lock")), None);
        assert_eq!(translate(&root(), &change("/vault/.git/objects/a.md")), None);
        assert_eq!(translate(&root(), &change("/elsewhere/a.md")), None);
    }

    #[test]
    fn test_translate_create_and_remove() {
        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/vault/new.md"));
        assert_eq!(
            translate(&root(), &created),
            Some(FileEvent::Changed(vec![PathBuf::from("new.md")]))
        );

        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/vault/old.md"));
        assert_eq!(
            translate(&root(), &removed),
            Some(FileEvent::Removed(vec![PathBuf::from("old.md")]))
        );
    }

    #[test]
    fn test_translate_two_path_rename() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/vault/old.md"))
            .add_path(PathBuf::from("/vault/sub/new.md"));
        assert_eq!(
            translate(&root(), &event),
            Some(FileEvent::Renamed {
                from: PathBuf::from("old.md"),
                to: PathBuf::from("sub/new.md"),
            })
        );
    }

    #[test]
    fn test_translate_rename_across_the_boundary() {
        let gone = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/vault/kept.md"))
            .add_path(PathBuf::from("/tmp/away.md"));
        assert_eq!(
            translate(&root(), &gone),
            Some(FileEvent::Removed(vec![PathBuf::from("kept.md")]))
        );

        let arrived = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/tmp/away.md"))
            .add_path(PathBuf::from("/vault/kept.md"));
        assert_eq!(
            translate(&root(), &arrived),
            Some(FileEvent::Changed(vec![PathBuf::from("kept.md")]))
        );
    }

    #[test]
    fn test_translate_one_sided_rename_kinds() {
        let from = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(PathBuf::from("/vault/a.md"));
        assert_eq!(
            translate(&root(), &from),
            Some(FileEvent::Removed(vec![PathBuf::from("a.md")]))
        );

        let to = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(PathBuf::from("/vault/a.md"));
        assert_eq!(
            translate(&root(), &to),
            Some(FileEvent::Changed(vec![PathBuf::from("a.md")]))
        );
    }

    #[test]
    fn test_translate_ignores_access_events() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Read))
            .add_path(PathBuf::from("/vault/a.md"));
        assert_eq!(translate(&root(), &event), None);
    }
}
