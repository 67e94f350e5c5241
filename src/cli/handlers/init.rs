use std::fs;

use crate::cli::commands::InitArgs;
use crate::io::vault::SETTINGS_FILE;

const SETTINGS_TEMPLATE: &str = r##"[board]
# Lines carrying this tag are board tasks.
filter_tag = "{filter_tag}"

# "all" shows every unfinished dated task in the todo column;
# "due-today" keeps only today's and overdue ones.
todo_mode = "all"

# Display cap for done columns without their own limit.
done_limit = 10

# Vault-relative path prefixes the board skips.
exclude = []

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

# Undated tasks land in a backlog column if you add one:
#
# [[columns]]
# id = "backlog"
# label = "Backlog"
# type = "backlog"
"##;

const STARTER_DOCUMENT: &str = "# Tasks\n\n- [ ] Add your first task {filter_tag}\n";

/// Default the filter tag, and give bare tags their `#`.
fn resolve_filter_tag(arg: Option<String>) -> String {
    match arg {
        Some(tag) if tag.starts_with('#') || tag.starts_with('@') => tag,
        Some(tag) => format!("#{}", tag),
        None => "#task".to_string(),
    }
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = match super::VAULT_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let settings_path = root.join(SETTINGS_FILE);

    if settings_path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to reinitialize)",
            SETTINGS_FILE
        )
        .into());
    }

    let filter_tag = resolve_filter_tag(args.filter_tag);
    fs::write(
        &settings_path,
        SETTINGS_TEMPLATE.replace("{filter_tag}", &filter_tag),
    )?;

    // A starter document, but never over someone's notes
    let starter = root.join("tasks.md");
    if !starter.exists() {
        fs::write(&starter, STARTER_DOCUMENT.replace("{filter_tag}", &filter_tag))?;
    }

    println!("Initialized lane vault in {}", root.display());
    println!("  settings: {}", SETTINGS_FILE);
    println!("  filter tag: {}", filter_tag);
    Ok(())
}
