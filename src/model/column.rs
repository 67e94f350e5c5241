use serde::{Deserialize, Serialize};

/// What a column holds. The variant decides assignment and ordering;
/// only tag columns carry a tag and only done columns carry a limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnKind {
    /// Dated, unfinished tasks
    Todo,
    /// Undated, unfinished tasks
    Backlog,
    /// Tasks carrying a specific tag (stored with its `#` prefix)
    Tag { tag: String },
    /// Finished tasks, newest first, optionally capped for display
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
}

/// One board column from `lane.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
    /// Rendering hint, carried through round trips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Collapsed columns render as a header summary only
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Column {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            id: id.into(),
            label: label.into(),
            kind,
            color: None,
            collapsed: false,
        }
    }

    /// The tag this column claims, if it is a tag column.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            ColumnKind::Tag { tag } => Some(tag),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.kind, ColumnKind::Done { .. })
    }

    pub fn is_todo(&self) -> bool {
        matches!(self.kind, ColumnKind::Todo)
    }

    pub fn is_backlog(&self) -> bool {
        matches!(self.kind, ColumnKind::Backlog)
    }
}
