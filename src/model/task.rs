use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Checklist status character inside the brackets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Incomplete,
    Done,
    InProgress,
    Cancelled,
    Important,
}

impl Status {
    /// The character used inside the checkbox `[ ]`
    pub fn marker(self) -> char {
        match self {
            Status::Incomplete => ' ',
            Status::Done => 'x',
            Status::InProgress => '/',
            Status::Cancelled => '-',
            Status::Important => '!',
        }
    }

    /// Parse a checkbox character into a status
    pub fn from_marker(c: char) -> Option<Status> {
        match c {
            ' ' => Some(Status::Incomplete),
            'x' => Some(Status::Done),
            '/' => Some(Status::InProgress),
            '-' => Some(Status::Cancelled),
            '!' => Some(Status::Important),
            _ => None,
        }
    }

    /// Done and cancelled tasks both count as finished for column
    /// assignment.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Cancelled)
    }
}

/// Task priority, from the glyph on the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Highest,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn glyph(self) -> char {
        match self {
            Priority::Highest => '🔺',
            Priority::High => '⏫',
            Priority::Medium => '🔼',
            Priority::Low => '🔽',
        }
    }

    /// Sort rank: highest sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Highest => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// Rank for an optional priority. Unprioritized tasks sort after `Low`.
pub fn priority_rank(priority: Option<Priority>) -> u8 {
    priority.map_or(4, Priority::rank)
}

/// Where a task lives: the document (vault-relative) and the 0-based
/// line index of its checklist line. Lines are shown 1-based to users.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId {
    pub path: PathBuf,
    pub line: usize,
}

impl TaskId {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        TaskId {
            path: path.into(),
            line,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line + 1)
    }
}

/// An indented checklist line under a task. Not itself a board card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub status: Status,
    pub text: String,
    /// 0-based line index in the document
    pub line: usize,
}

/// A parsed task line with everything the board needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub status: Status,
    /// Display text: the line with the filter tag, column tags,
    /// metadata tokens, priority glyphs, and context tags removed
    pub description: String,
    /// Tags from the line, marker prefix included (`#notes`, `@work`),
    /// minus the filter tag and any tag claimed by a column
    pub tags: Vec<String>,
    /// Line tags that match a configured column, in column
    /// configuration order
    pub column_tags: Vec<String>,
    /// Tags inherited from the document's front matter
    pub page_tags: Vec<String>,
    pub due: Option<NaiveDate>,
    pub done_date: Option<NaiveDate>,
    pub created: Option<NaiveDate>,
    pub scheduled: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub cancelled_date: Option<NaiveDate>,
    /// Recurrence rule text, uninterpreted
    pub recurrence: Option<String>,
    pub priority: Option<Priority>,
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// A task with no metadata, for building up in code and tests.
    pub fn new(id: TaskId, status: Status, description: impl Into<String>) -> Self {
        Task {
            id,
            status,
            description: description.into(),
            tags: Vec::new(),
            column_tags: Vec::new(),
            page_tags: Vec::new(),
            due: None,
            done_date: None,
            created: None,
            scheduled: None,
            start: None,
            cancelled_date: None,
            recurrence: None,
            priority: None,
            subtasks: Vec::new(),
        }
    }
}
