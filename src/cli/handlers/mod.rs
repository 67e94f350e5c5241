mod init;
pub use init::cmd_init;

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

/// Global override for the vault directory (set by -C flag)
static VAULT_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::app::{App, DropTransition};
use crate::board::column_for;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::lock::VaultLock;
use crate::io::settings_io;
use crate::io::watcher::VaultWatcher;
use crate::model::column::{Column, ColumnKind};
use crate::model::task::Task;
use crate::ops;
use crate::util::date::today;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    // Store -C override for open_app_cwd()
    if let Some(ref dir) = cli.vault_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        VAULT_DIR_OVERRIDE.lock().unwrap().replace(abs);
    }

    match cli.command {
        // Bare `lane` shows the board
        None => cmd_board(BoardArgs { column: None }, json),
        Some(cmd) => match cmd {
            // Init is handled before vault discovery
            Commands::Init(args) => cmd_init(args),

            // Read commands
            Commands::Board(args) => cmd_board(args, json),
            Commands::List(args) => cmd_list(args, json),

            // Write commands
            Commands::Move(args) => cmd_move(args),
            Commands::Done(args) => cmd_done(args),
            Commands::Undone(args) => cmd_undone(args),
            Commands::Tag(args) => cmd_tag(args),

            // Board management
            Commands::Columns(args) => cmd_columns(args, json),

            // Long-running
            Commands::Watch => cmd_watch(),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_app_cwd() -> Result<App, Box<dyn std::error::Error>> {
    let start = match VAULT_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    Ok(App::discover(&start)?)
}

/// Bare tags get a `#`; `#`- and `@`-prefixed tags pass through.
fn normalize_tag(tag: &str) -> String {
    if tag.starts_with('#') || tag.starts_with('@') {
        tag.to_string()
    } else {
        format!("#{}", tag)
    }
}

fn task_has_tag(task: &Task, tag: &str) -> bool {
    task.tags
        .iter()
        .chain(&task.column_tags)
        .chain(&task.page_tags)
        .any(|t| t == tag)
}

fn parse_column_kind(
    kind: &str,
    id: &str,
    tag: Option<&str>,
    limit: Option<usize>,
) -> Result<ColumnKind, String> {
    match kind {
        "todo" => Ok(ColumnKind::Todo),
        "backlog" => Ok(ColumnKind::Backlog),
        "tag" => {
            let tag = match tag {
                Some(t) => normalize_tag(t),
                None => format!("#{}", id),
            };
            Ok(ColumnKind::Tag { tag })
        }
        "done" => Ok(ColumnKind::Done { limit }),
        other => Err(format!(
            "unknown column type '{}' (expected: todo, backlog, tag, done)",
            other
        )),
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_board(args: BoardArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app_cwd()?;
    let view = app.board().tasks_by_column(today());

    let view = match args.column {
        Some(ref id) => {
            if app.board().settings().find_column(id).is_none() {
                return Err(format!("no such column: {}", id).into());
            }
            let mut filtered = IndexMap::new();
            if let Some(tasks) = view.get(id) {
                filtered.insert(id.clone(), tasks.clone());
            }
            filtered
        }
        None => view,
    };

    if json {
        let board = board_to_json(&view, app.board().settings());
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        for line in format_board_lines(&view, app.board().settings()) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_list(args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app_cwd()?;
    if let Some(ref id) = args.column
        && app.board().settings().find_column(id).is_none()
    {
        return Err(format!("no such column: {}", id).into());
    }
    let tag_filter = args.tag.as_deref().map(normalize_tag);

    let view = app.board().tasks_by_column(today());

    if json {
        let mut results = Vec::new();
        for (column_id, tasks) in &view {
            if let Some(ref filter) = args.column
                && column_id != filter
            {
                continue;
            }
            for task in tasks {
                if let Some(ref tag) = tag_filter
                    && !task_has_tag(task, tag)
                {
                    continue;
                }
                results.push(TaskWithColumnJson {
                    column: column_id.clone(),
                    task: task_to_json(task),
                });
            }
        }
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for (column_id, tasks) in &view {
            if let Some(ref filter) = args.column
                && column_id != filter
            {
                continue;
            }
            for task in tasks {
                if let Some(ref tag) = tag_filter
                    && !task_has_tag(task, tag)
                {
                    continue;
                }
                for line in format_task_entry(task) {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_move(args: MoveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (path, line) = parse_task_ref(&args.task)?;
    let mut app = open_app_cwd()?;

    if app.board().settings().find_column(&args.column).is_none() {
        return Err(format!("no such column: {}", args.column).into());
    }
    let from = {
        let Some(task) = app.board().find_task(&path, line) else {
            return Err(format!("task not found: {}", args.task).into());
        };
        column_for(task, app.board().settings())
    };

    let transition = DropTransition {
        path,
        line,
        from,
        to: args.column.clone(),
    };
    let changed = app.apply_transition(&transition, today())?;

    if changed {
        println!("{} → {}", args.task, args.column);
    } else {
        println!("no change: {} already in {}", args.task, args.column);
    }
    Ok(())
}

fn cmd_done(args: TaskRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let (path, line) = parse_task_ref(&args.task)?;
    let app = open_app_cwd()?;
    if app.board().find_task(&path, line).is_none() {
        return Err(format!("task not found: {}", args.task).into());
    }

    let column_tags = app.board().settings().column_tag_set();
    let date = today();
    let changed = app
        .vault()
        .rewrite_line(&path, line, |l| ops::complete(l, &column_tags, date))?;

    if changed {
        println!("{} → done", args.task);
    } else {
        println!("no change: {}", args.task);
    }
    Ok(())
}

fn cmd_undone(args: TaskRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let (path, line) = parse_task_ref(&args.task)?;
    let app = open_app_cwd()?;
    if app.board().find_task(&path, line).is_none() {
        return Err(format!("task not found: {}", args.task).into());
    }

    let changed = app.vault().rewrite_line(&path, line, ops::uncomplete)?;

    if changed {
        println!("{} reopened", args.task);
    } else {
        println!("no change: {}", args.task);
    }
    Ok(())
}

fn cmd_tag(args: TagArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (path, line) = parse_task_ref(&args.task)?;
    let app = open_app_cwd()?;
    if app.board().find_task(&path, line).is_none() {
        return Err(format!("task not found: {}", args.task).into());
    }

    let tag = normalize_tag(&args.tag);
    let changed = match args.action.as_str() {
        "add" => app
            .vault()
            .rewrite_line(&path, line, |l| ops::add_tag(l, &tag))?,
        "rm" => app
            .vault()
            .rewrite_line(&path, line, |l| ops::remove_tag(l, &tag))?,
        other => return Err(format!("unknown action '{}' (expected: add, rm)", other).into()),
    };

    if changed {
        println!("{} tag {} {}", args.task, args.action, tag);
    } else {
        println!("no change: {}", args.task);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Column management
// ---------------------------------------------------------------------------

fn cmd_columns(args: ColumnsCmd, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        None => cmd_columns_list(json),
        Some(ColumnsAction::Add(a)) => cmd_columns_add(a),
        Some(ColumnsAction::Rm(a)) => cmd_columns_rm(a),
    }
}

fn cmd_columns_list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app_cwd()?;
    let settings = app.board().settings();

    if json {
        println!("{}", serde_json::to_string_pretty(&settings.columns)?);
    } else {
        for column in &settings.columns {
            let kind = match &column.kind {
                ColumnKind::Todo => "todo".to_string(),
                ColumnKind::Backlog => "backlog".to_string(),
                ColumnKind::Tag { tag } => format!("tag {}", tag),
                ColumnKind::Done { limit: Some(n) } => format!("done, limit {}", n),
                ColumnKind::Done { limit: None } => "done".to_string(),
            };
            println!("{}  {}  [{}]", column.id, column.label, kind);
        }
    }
    Ok(())
}

fn cmd_columns_add(args: AddColumnArgs) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app_cwd()?;
    if app.board().settings().find_column(&args.id).is_some() {
        return Err(format!("column already exists: {}", args.id).into());
    }

    let kind = parse_column_kind(&args.kind, &args.id, args.tag.as_deref(), args.limit)?;
    let column = Column::new(args.id.clone(), args.label.clone(), kind);

    let _lock = VaultLock::acquire_default(app.vault().root())?;
    let (_, mut doc) = settings_io::read_settings_doc(app.vault().root())?;
    settings_io::add_column(&mut doc, &column);
    settings_io::write_settings_doc(app.vault().root(), &doc)?;

    println!("added column: {} ({})", args.label, args.id);
    Ok(())
}

fn cmd_columns_rm(args: ColumnIdArg) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app_cwd()?;

    let _lock = VaultLock::acquire_default(app.vault().root())?;
    let (_, mut doc) = settings_io::read_settings_doc(app.vault().root())?;
    if !settings_io::remove_column(&mut doc, &args.id) {
        return Err(format!("no such column: {}", args.id).into());
    }
    settings_io::write_settings_doc(app.vault().root(), &doc)?;

    println!("removed column: {}", args.id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Watch mode
// ---------------------------------------------------------------------------

fn cmd_watch() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app_cwd()?;
    let watcher = VaultWatcher::start(app.vault().root())?;

    // start dirty so the first pass paints the board
    let dirty = Rc::new(Cell::new(true));
    let flag = Rc::clone(&dirty);
    app.vault_mut().subscribe(Box::new(move |_| flag.set(true)));

    loop {
        for event in watcher.poll() {
            app.handle_event(&event, Instant::now());
        }
        app.tick(Instant::now());

        if dirty.replace(false) {
            // clear and repaint
            print!("\x1b[2J\x1b[H");
            let view = app.board().tasks_by_column(today());
            for line in format_board_lines(&view, app.board().settings()) {
                println!("{}", line);
            }
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
