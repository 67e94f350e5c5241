use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::settings::BoardSettings;
use crate::model::task::{Status, Subtask, Task, TaskId};
use crate::parse::{front_matter, metadata};

/// Checklist shape: optional indent, `- [`, one status character,
/// `] `, text. Lines with an unrecognized status character are not
/// checklist lines for the board.
static CHECKLIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)- \[(.)\] (.*)$").unwrap());

/// A structurally valid checklist line, before any task-level rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistLine<'a> {
    pub indent: &'a str,
    pub status: Status,
    pub text: &'a str,
}

/// Split a line into indent, status, and text. `None` when the line is
/// not checklist syntax or its status character is unknown.
pub fn parse_checklist_line(line: &str) -> Option<ChecklistLine<'_>> {
    let caps = CHECKLIST_RE.captures(line)?;
    let status = Status::from_marker(caps[2].chars().next()?)?;
    Some(ChecklistLine {
        indent: caps.get(1).unwrap().as_str(),
        status,
        text: caps.get(3).unwrap().as_str(),
    })
}

/// Parse one document into board tasks.
///
/// Only top-level checklist lines whose text contains the filter tag
/// become tasks; everything else is plain prose to the board. `path`
/// is the document's vault-relative path, recorded into each task id.
pub fn parse_document(path: &Path, text: &str, settings: &BoardSettings) -> Vec<Task> {
    let (page_tags, body_start) = front_matter::page_tags(text);
    let lines: Vec<&str> = text.lines().collect();
    let filter = settings.board.filter_tag.as_str();

    let mut tasks = Vec::new();
    let mut idx = body_start;
    while idx < lines.len() {
        match parse_checklist_line(lines[idx]) {
            Some(line) if line.indent.is_empty() && line.text.contains(filter) => {
                let (task, next) = parse_task(path, &lines, idx, &line, settings, &page_tags);
                tasks.push(task);
                idx = next;
            }
            _ => idx += 1,
        }
    }
    tasks
}

/// Parse the task at `start` and collect its subtask block.
/// Returns the task and the line index where collection stopped.
fn parse_task(
    path: &Path,
    lines: &[&str],
    start: usize,
    line: &ChecklistLine<'_>,
    settings: &BoardSettings,
    page_tags: &[String],
) -> (Task, usize) {
    let filter = settings.board.filter_tag.as_str();
    let column_tag_set = settings.column_tag_set();

    let meta = metadata::extract(line.text);
    let all_tags = metadata::line_tags(line.text);

    // Tags claimed by a column, in column configuration order
    let mut column_tags = Vec::new();
    for wanted in &column_tag_set {
        if all_tags.iter().any(|t| t == wanted) {
            column_tags.push(wanted.clone());
        }
    }
    // The rest keep text order; the filter tag belongs to no set
    let mut tags: Vec<String> = Vec::new();
    for tag in all_tags {
        if tag != filter && !column_tag_set.contains(&tag) && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let description = metadata::clean_description(line.text, filter, &column_tag_set);

    let (subtasks, next) = collect_subtasks(lines, start + 1, filter, &column_tag_set);

    let task = Task {
        id: TaskId::new(path, start),
        status: line.status,
        description,
        tags,
        column_tags,
        page_tags: page_tags.to_vec(),
        due: meta.due,
        done_date: meta.done,
        created: meta.created,
        scheduled: meta.scheduled,
        start: meta.start,
        cancelled_date: meta.cancelled,
        recurrence: meta.recurrence,
        priority: meta.priority,
        subtasks,
    };
    (task, next)
}

/// Walk the lines under a task: indented checklist lines become
/// subtasks, their text cleaned the same way as a task description;
/// blank lines and indented notes pass through. The walk stops at the
/// first top-level checklist line or any other non-indented, non-blank
/// content.
fn collect_subtasks(
    lines: &[&str],
    start: usize,
    filter: &str,
    column_tags: &[String],
) -> (Vec<Subtask>, usize) {
    let mut subtasks = Vec::new();
    let mut idx = start;
    while idx < lines.len() {
        let line = lines[idx];
        if let Some(sub) = parse_checklist_line(line) {
            if sub.indent.is_empty() {
                break;
            }
            subtasks.push(Subtask {
                status: sub.status,
                text: metadata::clean_description(sub.text, filter, column_tags),
                line: idx,
            });
            idx += 1;
            continue;
        }
        if line.trim().is_empty() || line.starts_with(' ') || line.starts_with('\t') {
            idx += 1;
            continue;
        }
        break;
    }
    (subtasks, idx)
}
