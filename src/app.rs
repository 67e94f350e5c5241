use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;

use crate::board::Board;
use crate::io::debounce::ReparseQueue;
use crate::io::settings_io::{read_settings, SettingsError};
use crate::io::vault::{discover_vault, Vault, VaultError, VaultEvent, SETTINGS_FILE};
use crate::io::watcher::FileEvent;
use crate::ops;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Vault(#[from] VaultError),
    #[error("{0}")]
    Settings(#[from] SettingsError),
}

/// One completed drag: a task identity plus its source and target
/// column ids. Paths are vault-relative, lines 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTransition {
    pub path: PathBuf,
    pub line: usize,
    pub from: String,
    pub to: String,
}

/// The event-driven core: one vault, its indexed board, and the
/// debounce queue between file events and reparses.
///
/// Everything runs on the caller's thread. File events come in through
/// `handle_event`, time comes in through `tick`, and the board is
/// always readable in between.
pub struct App {
    vault: Vault,
    board: Board,
    queue: ReparseQueue,
}

impl App {
    /// Open the vault at `root` and index every document in it.
    pub fn open(root: &Path) -> Result<Self, AppError> {
        let vault = Vault::open(root)?;
        let settings = read_settings(root)?;
        let mut app = App {
            vault,
            board: Board::new(settings),
            queue: ReparseQueue::new(),
        };
        app.load_all()?;
        Ok(app)
    }

    /// Walk up from `start` to find the vault root, then open it.
    pub fn discover(start: &Path) -> Result<Self, AppError> {
        let root = discover_vault(start)?;
        Self::open(&root)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut Vault {
        &mut self.vault
    }

    /// When the app next wants a `tick`, if ever.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    fn load_all(&mut self) -> Result<(), VaultError> {
        let exclude = self.board.settings().board.exclude.clone();
        for rel in self.vault.list_documents(&exclude)? {
            match self.vault.read_document(&rel) {
                Ok(text) => self.board.reindex_document(&rel, &text),
                // an unreadable document contributes zero tasks
                Err(_) => self.board.remove_document(&rel),
            }
        }
        Ok(())
    }

    fn tracked(&self, path: &Path) -> bool {
        !self
            .board
            .settings()
            .board
            .exclude
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    /// Feed one watcher event in. Document changes only schedule work;
    /// the reparse itself happens in `tick` once the quiet window ends.
    /// Removals and renames take effect immediately.
    pub fn handle_event(&mut self, event: &FileEvent, now: Instant) {
        match event {
            FileEvent::Changed(paths) => {
                for path in paths {
                    if path == Path::new(SETTINGS_FILE) {
                        self.reload_settings();
                    } else if self.tracked(path) {
                        self.queue.schedule(path, now);
                    }
                }
            }
            FileEvent::Removed(paths) => {
                for path in paths {
                    if self.tracked(path) {
                        self.queue.discard(path);
                        self.board.remove_document(path);
                        self.vault.publish(&VaultEvent::Deleted(path.clone()));
                    }
                }
            }
            FileEvent::Renamed { from, to } => match (self.tracked(from), self.tracked(to)) {
                (true, true) => {
                    self.queue.discard(from);
                    self.board.rename_document(from, to);
                    self.vault.publish(&VaultEvent::Renamed {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
                (true, false) => {
                    // moved into an excluded folder: gone from the board
                    self.queue.discard(from);
                    self.board.remove_document(from);
                    self.vault.publish(&VaultEvent::Deleted(from.clone()));
                }
                (false, true) => {
                    // surfaced from an excluded folder: parse it fresh
                    self.queue.schedule(to, now);
                }
                (false, false) => {}
            },
        }
    }

    /// Run any reparse whose quiet window has passed.
    pub fn tick(&mut self, now: Instant) {
        for path in self.queue.drain_due(now) {
            match self.vault.read_document(&path) {
                Ok(text) => self.board.reindex_document(&path, &text),
                // unreadable this cycle: the document holds no tasks
                // until a later read succeeds
                Err(_) => self.board.remove_document(&path),
            }
            self.vault.publish(&VaultEvent::Changed(path));
        }
    }

    /// Re-read the settings file. A malformed file keeps the last good
    /// configuration; column membership recomputes from the new
    /// settings on the next view without any document reparse.
    pub fn reload_settings(&mut self) {
        if let Ok(settings) = read_settings(self.vault.root()) {
            self.board.set_settings(settings);
            self.vault
                .publish(&VaultEvent::Changed(PathBuf::from(SETTINGS_FILE)));
        }
    }

    /// Apply one drag transition to the underlying document.
    ///
    /// Returns whether a line actually changed. Same-column drops, a
    /// target column that no longer exists, a task that vanished from
    /// the index, and a document missing at write time are all silent
    /// no-ops.
    pub fn apply_transition(
        &mut self,
        transition: &DropTransition,
        today: NaiveDate,
    ) -> Result<bool, AppError> {
        if transition.from == transition.to {
            return Ok(false);
        }
        let Some(target) = self.board.settings().find_column(&transition.to).cloned() else {
            return Ok(false);
        };
        if self
            .board
            .find_task(&transition.path, transition.line)
            .is_none()
        {
            return Ok(false);
        }

        let column_tags = self.board.settings().column_tag_set();
        let changed = self
            .vault
            .rewrite_line(&transition.path, transition.line, |line| {
                ops::move_to_column(line, &target, &column_tags, today)
            })?;

        if changed {
            // fold the write back in now rather than waiting out the
            // watcher's debounce
            if let Ok(text) = self.vault.read_document(&transition.path) {
                self.board.reindex_document(&transition.path, &text);
            }
            self.vault
                .publish(&VaultEvent::Changed(transition.path.clone()));
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const SETTINGS: &str = r##"[board]
filter_tag = "#task"

[[columns]]
id = "todo"
label = "To Do"
type = "todo"

[[columns]]
id = "doing"
label = "Doing"
type = "tag"
tag = "#doing"

[[columns]]
id = "done"
label = "Done"
type = "done"
"##;

    fn create_vault(tmp: &TempDir) {
        fs::write(tmp.path().join(SETTINGS_FILE), SETTINGS).unwrap();
        fs::write(
            tmp.path().join("plan.md"),
            "# Plan\n\n- [ ] write draft #task 📅 2026-03-09\n- [/] edit copy #task #doing\n",
        )
        .unwrap();
    }

    fn today() -> NaiveDate {
        crate::util::date::parse_date("2026-03-10").unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_open_indexes_all_documents() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        fs::write(tmp.path().join("extra.md"), "- [ ] more work #task\n").unwrap();

        let app = App::open(tmp.path()).unwrap();
        assert_eq!(app.board().task_count(), 3);
    }

    #[test]
    fn test_open_skips_excluded_folders() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(SETTINGS_FILE),
            "[board]\nexclude = [\"archive\"]\n",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("archive")).unwrap();
        fs::write(tmp.path().join("live.md"), "- [ ] here #task\n").unwrap();
        fs::write(tmp.path().join("archive/old.md"), "- [ ] gone #task\n").unwrap();

        let app = App::open(tmp.path()).unwrap();
        assert_eq!(app.board().task_count(), 1);
    }

    #[test]
    fn test_discover_from_nested_directory() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let nested = tmp.path().join("projects/deep");
        fs::create_dir_all(&nested).unwrap();

        let app = App::discover(&nested).unwrap();
        assert_eq!(app.board().task_count(), 2);
    }

    #[test]
    fn test_change_event_waits_out_the_quiet_window() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();
        let base = Instant::now();

        fs::write(
            tmp.path().join("plan.md"),
            "- [ ] rewritten #task\n- [ ] and another #task\n- [ ] third #task\n",
        )
        .unwrap();
        app.handle_event(
            &FileEvent::Changed(vec![PathBuf::from("plan.md")]),
            base,
        );

        // still the old parse inside the window
        app.tick(base + ms(100));
        assert_eq!(app.board().task_count(), 2);

        app.tick(base + ms(400));
        assert_eq!(app.board().task_count(), 3);
    }

    #[test]
    fn test_change_event_for_excluded_path_is_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(SETTINGS_FILE),
            "[board]\nexclude = [\"archive\"]\n",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("archive")).unwrap();
        fs::write(tmp.path().join("archive/old.md"), "- [ ] gone #task\n").unwrap();

        let mut app = App::open(tmp.path()).unwrap();
        let base = Instant::now();
        app.handle_event(
            &FileEvent::Changed(vec![PathBuf::from("archive/old.md")]),
            base,
        );
        app.tick(base + ms(400));
        assert_eq!(app.board().task_count(), 0);
    }

    #[test]
    fn test_removed_event_evicts_immediately() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();

        app.handle_event(
            &FileEvent::Removed(vec![PathBuf::from("plan.md")]),
            Instant::now(),
        );
        assert_eq!(app.board().task_count(), 0);
    }

    #[test]
    fn test_unreadable_document_contributes_zero_tasks() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();
        let base = Instant::now();

        fs::remove_file(tmp.path().join("plan.md")).unwrap();
        app.handle_event(
            &FileEvent::Changed(vec![PathBuf::from("plan.md")]),
            base,
        );
        app.tick(base + ms(400));
        assert_eq!(app.board().task_count(), 0);
    }

    #[test]
    fn test_rename_event_rehomes_tasks() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();

        app.handle_event(
            &FileEvent::Renamed {
                from: PathBuf::from("plan.md"),
                to: PathBuf::from("renamed.md"),
            },
            Instant::now(),
        );
        assert!(app.board().find_task(Path::new("renamed.md"), 2).is_some());
        assert!(app.board().find_task(Path::new("plan.md"), 2).is_none());
    }

    #[test]
    fn test_settings_event_reloads_columns_without_reparse() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        fs::write(
            tmp.path().join("tagged.md"),
            "- [ ] review the spec #task #review\n",
        )
        .unwrap();
        let mut app = App::open(tmp.path()).unwrap();

        let view = app.board().tasks_by_column(today());
        assert_eq!(view["todo"].len(), 2);

        let mut extended = SETTINGS.to_string();
        extended.push_str(
            "\n[[columns]]\nid = \"review\"\nlabel = \"Review\"\ntype = \"tag\"\ntag = \"#review\"\n",
        );
        fs::write(tmp.path().join(SETTINGS_FILE), extended).unwrap();
        app.handle_event(
            &FileEvent::Changed(vec![PathBuf::from(SETTINGS_FILE)]),
            Instant::now(),
        );

        let view = app.board().tasks_by_column(today());
        assert_eq!(view["review"].len(), 1);
        assert_eq!(view["todo"].len(), 1);
    }

    #[test]
    fn test_malformed_settings_keeps_last_good() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();

        fs::write(tmp.path().join(SETTINGS_FILE), "columns = 7").unwrap();
        app.reload_settings();

        assert_eq!(app.board().settings().columns.len(), 3);
    }

    #[test]
    fn test_apply_transition_moves_a_task() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();

        let changed = app
            .apply_transition(
                &DropTransition {
                    path: PathBuf::from("plan.md"),
                    line: 2,
                    from: "todo".to_string(),
                    to: "doing".to_string(),
                },
                today(),
            )
            .unwrap();
        assert!(changed);

        let text = fs::read_to_string(tmp.path().join("plan.md")).unwrap();
        assert!(text.contains("- [ ] write draft #task #doing 📅 2026-03-09"));
        // the board reindexed without waiting for the watcher
        let view = app.board().tasks_by_column(today());
        assert_eq!(view["doing"].len(), 2);
    }

    #[test]
    fn test_apply_transition_silent_noops() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();

        // same column
        let same = DropTransition {
            path: PathBuf::from("plan.md"),
            line: 2,
            from: "todo".to_string(),
            to: "todo".to_string(),
        };
        assert!(!app.apply_transition(&same, today()).unwrap());

        // unknown target column
        let unknown = DropTransition {
            path: PathBuf::from("plan.md"),
            line: 2,
            from: "todo".to_string(),
            to: "ghost".to_string(),
        };
        assert!(!app.apply_transition(&unknown, today()).unwrap());

        // task not in the index
        let vanished = DropTransition {
            path: PathBuf::from("plan.md"),
            line: 40,
            from: "todo".to_string(),
            to: "doing".to_string(),
        };
        assert!(!app.apply_transition(&vanished, today()).unwrap());

        let text = fs::read_to_string(tmp.path().join("plan.md")).unwrap();
        assert!(text.contains("- [ ] write draft #task 📅 2026-03-09"));
    }

    #[test]
    fn test_transition_notifies_observers() {
        let tmp = TempDir::new().unwrap();
        create_vault(&tmp);
        let mut app = App::open(tmp.path()).unwrap();

        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        app.vault_mut().subscribe(Box::new(move |event| {
            sink.borrow_mut().push(event.clone());
        }));

        app.apply_transition(
            &DropTransition {
                path: PathBuf::from("plan.md"),
                line: 2,
                from: "todo".to_string(),
                to: "doing".to_string(),
            },
            today(),
        )
        .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![VaultEvent::Changed(PathBuf::from("plan.md"))]
        );
    }
}
