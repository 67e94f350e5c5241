pub mod assign;
pub mod order;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::model::settings::BoardSettings;
use crate::model::task::Task;
use crate::parse::parse_document;

pub use assign::column_for;
pub use order::arrange;

/// In-memory index of every task in the vault, keyed by document.
///
/// The board holds parsed tasks only; column membership and ordering
/// are computed on demand from the current settings, so a settings
/// change never requires a reparse.
pub struct Board {
    settings: BoardSettings,
    documents: BTreeMap<PathBuf, Vec<Task>>,
}

impl Board {
    pub fn new(settings: BoardSettings) -> Self {
        Board {
            settings,
            documents: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: BoardSettings) {
        self.settings = settings;
    }

    /// Replace the tasks indexed for one document with a fresh parse
    /// of `text`.
    pub fn reindex_document(&mut self, path: &Path, text: &str) {
        let tasks = parse_document(path, text, &self.settings);
        if tasks.is_empty() {
            self.documents.remove(path);
        } else {
            self.documents.insert(path.to_path_buf(), tasks);
        }
    }

    /// Drop every task parsed from `path`.
    pub fn remove_document(&mut self, path: &Path) {
        self.documents.remove(path);
    }

    /// Re-home tasks under a renamed document without reparsing; task
    /// line numbers and content are unchanged by a rename.
    pub fn rename_document(&mut self, from: &Path, to: &Path) {
        if let Some(mut tasks) = self.documents.remove(from) {
            for task in &mut tasks {
                task.id.path = to.to_path_buf();
            }
            self.documents.insert(to.to_path_buf(), tasks);
        }
    }

    /// All indexed tasks in document order: path, then line.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.documents.values().flatten()
    }

    pub fn task_count(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    pub fn find_task(&self, path: &Path, line: usize) -> Option<&Task> {
        self.documents
            .get(path)?
            .iter()
            .find(|t| t.id.line == line)
    }

    /// The board view: configured columns in order, each holding its
    /// assigned tasks sorted for display. Tasks whose assigned column
    /// id resolves to no configured column are left out.
    pub fn tasks_by_column(&self, today: NaiveDate) -> IndexMap<String, Vec<&Task>> {
        let mut buckets: BTreeMap<String, Vec<&Task>> = BTreeMap::new();
        for task in self.tasks() {
            let id = assign::column_for(task, &self.settings);
            buckets.entry(id).or_default().push(task);
        }

        let mut view = IndexMap::new();
        for column in &self.settings.columns {
            let tasks = buckets.remove(&column.id).unwrap_or_default();
            view.insert(
                column.id.clone(),
                order::arrange(column, tasks, &self.settings, today),
            );
        }
        view
    }
}
