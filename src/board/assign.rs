use crate::model::settings::BoardSettings;
use crate::model::task::Task;

/// Decide which column a task belongs to. Returns a column id, which
/// may be a literal fallback (`"done"`, `"todo"`) that does not resolve
/// against the configuration; unresolvable ids drop from the view.
///
/// Decision order:
/// 1. done or cancelled status → the done column
/// 2. first tag column (configuration order) whose tag is on the line
/// 3. undated → the backlog column, when one exists
/// 4. everything else → the todo column
pub fn column_for(task: &Task, settings: &BoardSettings) -> String {
    if task.status.is_terminal() {
        return settings.done_column_id().to_string();
    }

    // Tags are checked against the live configuration, not the split
    // recorded at parse time, so a column added after parsing still
    // claims its tasks without a reparse.
    for (id, tag) in settings.tag_columns() {
        if task.column_tags.iter().any(|t| t == tag) || task.tags.iter().any(|t| t == tag) {
            return id.to_string();
        }
    }

    if task.due.is_none()
        && let Some(id) = settings.backlog_column_id()
    {
        return id.to_string();
    }

    settings.todo_column_id().to_string()
}
