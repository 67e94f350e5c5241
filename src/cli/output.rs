use std::path::PathBuf;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::settings::BoardSettings;
use crate::model::task::{Priority, Status, Subtask, Task};
use crate::util::date::format_date;
use crate::util::text::truncate_to_width;

/// Widest a board cell's description gets before it is cut.
const CELL_WIDTH: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub file: String,
    /// 1-based, matching what editors show
    pub line: usize,
    pub status: Status,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubtaskJson>,
}

#[derive(Serialize)]
pub struct SubtaskJson {
    pub status: Status,
    pub text: String,
    pub line: usize,
}

#[derive(Serialize)]
pub struct TaskWithColumnJson {
    pub column: String,
    #[serde(flatten)]
    pub task: TaskJson,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub columns: Vec<ColumnJson>,
}

#[derive(Serialize)]
pub struct ColumnJson {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "is_false")]
    pub collapsed: bool,
    pub tasks: Vec<TaskJson>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        file: task.id.path.display().to_string(),
        line: task.id.line + 1,
        status: task.status,
        description: task.description.clone(),
        tags: task.tags.clone(),
        column_tags: task.column_tags.clone(),
        due: task.due,
        done: task.done_date,
        created: task.created,
        scheduled: task.scheduled,
        start: task.start,
        cancelled: task.cancelled_date,
        recurrence: task.recurrence.clone(),
        priority: task.priority,
        subtasks: task.subtasks.iter().map(subtask_to_json).collect(),
    }
}

fn subtask_to_json(sub: &Subtask) -> SubtaskJson {
    SubtaskJson {
        status: sub.status,
        text: sub.text.clone(),
        line: sub.line + 1,
    }
}

pub fn board_to_json(
    view: &IndexMap<String, Vec<&Task>>,
    settings: &BoardSettings,
) -> BoardJson {
    let columns = view
        .iter()
        .filter_map(|(id, tasks)| {
            let column = settings.find_column(id)?;
            Some(ColumnJson {
                id: column.id.clone(),
                label: column.label.clone(),
                collapsed: column.collapsed,
                tasks: tasks.iter().map(|t| task_to_json(t)).collect(),
            })
        })
        .collect();
    BoardJson { columns }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Date and priority markers shown after the description, in the order
/// they read best: priority, due, completion.
fn metadata_suffix(task: &Task) -> String {
    let mut out = String::new();
    if let Some(p) = task.priority {
        out.push(' ');
        out.push(p.glyph());
    }
    if let Some(due) = task.due {
        out.push_str(&format!(" 📅 {}", format_date(due)));
    }
    if let Some(done) = task.done_date {
        out.push_str(&format!(" ✅ {}", format_date(done)));
    }
    out
}

/// One board cell: checkbox, description cut to the cell width, markers.
pub fn format_task_cell(task: &Task) -> String {
    format!(
        "[{}] {}{}",
        task.status.marker(),
        truncate_to_width(&task.description, CELL_WIDTH),
        metadata_suffix(task)
    )
}

/// One listing entry: location first so the output greps and clicks,
/// full description, markers. Subtasks follow indented.
pub fn format_task_entry(task: &Task) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "{}  [{}] {}{}",
        task.id,
        task.status.marker(),
        task.description,
        metadata_suffix(task)
    ));
    for sub in &task.subtasks {
        lines.push(format!("  [{}] {}", sub.status.marker(), sub.text));
    }
    lines
}

/// Render the board as text, one section per column. Collapsed columns
/// show only their header count.
pub fn format_board_lines(
    view: &IndexMap<String, Vec<&Task>>,
    settings: &BoardSettings,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (id, tasks) in view {
        let Some(column) = settings.find_column(id) else {
            continue;
        };
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{} ({})", column.label, tasks.len()));
        if column.collapsed {
            continue;
        }
        for task in tasks {
            lines.push(format!("  {}", format_task_cell(task)));
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

/// Parse a `file.md:LINE` reference into a vault-relative path and a
/// 0-based line index. Lines are 1-based on the way in.
pub fn parse_task_ref(s: &str) -> Result<(PathBuf, usize), String> {
    let Some((path, line)) = s.rsplit_once(':') else {
        return Err(format!(
            "invalid task reference '{}' (expected: file.md:LINE)",
            s
        ));
    };
    let line: usize = line
        .parse()
        .map_err(|_| format!("invalid line number in task reference '{}'", s))?;
    if path.is_empty() || line == 0 {
        return Err(format!(
            "invalid task reference '{}' (expected: file.md:LINE)",
            s
        ));
    }
    Ok((PathBuf::from(path), line - 1))
}
