use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lane", about = concat!("[|] lane v", env!("CARGO_PKG_VERSION"), " - a kanban board over plain markdown"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different vault directory
    #[arg(short = 'C', long = "vault-dir", global = true)]
    pub vault_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new vault in the current directory
    Init(InitArgs),
    /// Show the board (default when no subcommand is given)
    Board(BoardArgs),
    /// List tasks as flat lines
    List(ListArgs),
    /// Move a task to a column
    Move(MoveArgs),
    /// Mark a task done (shortcut for move to the done column)
    Done(TaskRefArg),
    /// Reopen a done task
    Undone(TaskRefArg),
    /// Add or remove tags on a task line
    Tag(TagArgs),
    /// Column management
    Columns(ColumnsCmd),
    /// Watch the vault and reprint the board on changes
    Watch,
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Filter tag for task lines (default: #task)
    #[arg(long)]
    pub filter_tag: Option<String>,
    /// Reinitialize even if lane.toml already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct BoardArgs {
    /// Show a single column
    pub column: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Limit to one column
    #[arg(long)]
    pub column: Option<String>,
    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MoveArgs {
    /// Task reference as file:line (1-based line, as shown by list)
    pub task: String,
    /// Target column id
    pub column: String,
}

#[derive(Args)]
pub struct TaskRefArg {
    /// Task reference as file:line
    pub task: String,
}

#[derive(Args)]
pub struct TagArgs {
    /// Task reference as file:line
    pub task: String,
    /// Action: "add" or "rm"
    pub action: String,
    /// Tag, with or without the leading #
    pub tag: String,
}

// ---------------------------------------------------------------------------
// Column management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ColumnsCmd {
    #[command(subcommand)]
    pub action: Option<ColumnsAction>,
}

#[derive(Subcommand)]
pub enum ColumnsAction {
    /// Add a column to the board
    Add(AddColumnArgs),
    /// Remove a column from the board
    Rm(ColumnIdArg),
}

#[derive(Args)]
pub struct AddColumnArgs {
    /// Column id
    pub id: String,
    /// Column label
    pub label: String,
    /// Column type (todo, backlog, tag, done)
    #[arg(long = "type", value_name = "TYPE", default_value = "tag")]
    pub kind: String,
    /// Tag routed to this column (tag columns; default: #<id>)
    #[arg(long)]
    pub tag: Option<String>,
    /// Display limit (done columns)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ColumnIdArg {
    /// Column id
    pub id: String,
}
