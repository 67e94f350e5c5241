use serde::{Deserialize, Serialize};

use super::column::{Column, ColumnKind};

/// Configuration from lane.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSettings {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Literal substring a line must contain to count as a task
    #[serde(default = "default_filter_tag")]
    pub filter_tag: String,
    #[serde(default)]
    pub todo_mode: TodoMode,
    /// Display cap for done columns without their own limit
    #[serde(default = "default_done_limit")]
    pub done_limit: usize,
    /// Vault-relative path prefixes to skip when listing documents
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Which unfinished dated tasks the todo column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TodoMode {
    #[default]
    All,
    DueToday,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            filter_tag: default_filter_tag(),
            todo_mode: TodoMode::default(),
            done_limit: default_done_limit(),
            exclude: Vec::new(),
        }
    }
}

fn default_filter_tag() -> String {
    "#task".to_string()
}

fn default_done_limit() -> usize {
    10
}

impl Default for BoardSettings {
    /// The starter board: todo / doing / done.
    fn default() -> Self {
        BoardSettings {
            board: BoardConfig::default(),
            columns: vec![
                Column::new("todo", "To Do", ColumnKind::Todo),
                Column::new(
                    "doing",
                    "Doing",
                    ColumnKind::Tag {
                        tag: "#doing".to_string(),
                    },
                ),
                Column::new("done", "Done", ColumnKind::Done { limit: None }),
            ],
        }
    }
}

impl BoardSettings {
    pub fn find_column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Tag columns in configuration order, as `(column id, tag)` pairs.
    pub fn tag_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .filter_map(|c| c.tag().map(|t| (c.id.as_str(), t)))
    }

    /// Every tag claimed by a column, in configuration order.
    pub fn column_tag_set(&self) -> Vec<String> {
        self.tag_columns().map(|(_, t)| t.to_string()).collect()
    }

    /// Id of the column finished tasks go to. Falls back to the literal
    /// `"done"`, which may not resolve against the configuration.
    pub fn done_column_id(&self) -> &str {
        self.columns
            .iter()
            .find(|c| c.is_done())
            .map(|c| c.id.as_str())
            .unwrap_or("done")
    }

    /// Id of the column dated unfinished tasks go to. Falls back to the
    /// literal `"todo"`.
    pub fn todo_column_id(&self) -> &str {
        self.columns
            .iter()
            .find(|c| c.is_todo())
            .map(|c| c.id.as_str())
            .unwrap_or("todo")
    }

    pub fn backlog_column_id(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.is_backlog())
            .map(|c| c.id.as_str())
    }

    /// Display cap for a done column: its own limit, else the global one.
    pub fn done_limit_for(&self, column: &Column) -> usize {
        match column.kind {
            ColumnKind::Done { limit: Some(n) } => n,
            _ => self.board.done_limit,
        }
    }
}
