use std::cmp::Reverse;

use chrono::NaiveDate;

use crate::model::column::{Column, ColumnKind};
use crate::model::settings::{BoardSettings, TodoMode};
use crate::model::task::{priority_rank, Task};
use crate::util::date::{due_group, DueGroup};

/// Sort (and for done columns, cap) a column's tasks for display.
/// All sorts are stable, so ties keep document order: path, then line.
pub fn arrange<'a>(
    column: &Column,
    mut tasks: Vec<&'a Task>,
    settings: &BoardSettings,
    today: NaiveDate,
) -> Vec<&'a Task> {
    match &column.kind {
        ColumnKind::Todo => {
            if settings.board.todo_mode == TodoMode::DueToday {
                tasks.retain(|t| due_group(t.due, today) != DueGroup::Other);
            }
            tasks.sort_by_key(|t| (due_group(t.due, today).rank(), priority_rank(t.priority)));
        }
        ColumnKind::Backlog | ColumnKind::Tag { .. } => {
            tasks.sort_by_key(|t| priority_rank(t.priority));
        }
        ColumnKind::Done { .. } => {
            // Reverse(None) sorts after every Reverse(Some), so undated
            // completions trail the dated ones.
            tasks.sort_by_key(|t| Reverse(t.done_date));
            tasks.truncate(settings.done_limit_for(column));
        }
    }
    tasks
}
