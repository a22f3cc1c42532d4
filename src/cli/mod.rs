#![forbid(unsafe_code)]

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};

use crate::board::Board;
use crate::config::{self, Config};
use crate::output::board::write_board;
use crate::output::table::Table;
use crate::task::model::{self, Status};
use crate::task::storage::{Outcome, TaskStore};
use crate::tui;

#[derive(Debug, Parser)]
#[command(name = "kanban", version, about = "Three-column to-do board")]
pub struct Cli {
    /// Task file to use instead of the configured store.path
    #[arg(long = "file", global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the board
    #[command(alias = "show")]
    Board,
    /// Add a task to "To do"
    Add(AddArgs),
    /// List tasks
    #[command(alias = "ls")]
    List(ListArgs),
    /// Move a task to another column
    #[command(alias = "mv")]
    Move(MoveArgs),
    /// Delete a task
    #[command(alias = "rm")]
    Delete(DeleteArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Date as YYYY-MM-DD (defaults to today)
    #[arg(short = 'd', long = "date")]
    pub date: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Only tasks in this column (todo, doing, done)
    #[arg(short = 's', long = "status")]
    pub status: Option<String>,
    /// Output in JSON format
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,
    /// Output as CSV
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct MoveArgs {
    pub id: u64,
    /// Target column (todo, doing, done)
    pub status: String,
}

#[derive(Debug, Parser)]
pub struct DeleteArgs {
    pub id: u64,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();

    // The interactive board owns the terminal; log lines would tear it.
    let interactive = cli.cmd.is_none() && tui::is_tty();
    if !interactive {
        init_tracing();
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    // WARN by default; RUST_LOG=info or debug for more.
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None => cmd_default(cli.file),
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "kanban", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config(args)) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Set(set) => {
                config::set_value_string(&set.key, &set.value)?;
                println!("Set {} = {}", set.key, set.value);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Get(get) => match config::get_value_string(&get.key)? {
                Some(v) => {
                    println!("{v}");
                    Ok(ExitCode::SUCCESS)
                }
                None => anyhow::bail!(
                    "configuration key '{}' not found - use 'kanban config list' to see available keys",
                    get.key
                ),
            },
        },
        Some(Commands::Board) => cmd_board(cli.file),
        Some(Commands::Add(args)) => cmd_add(cli.file, &args),
        Some(Commands::List(args)) => cmd_list(cli.file, &args),
        Some(Commands::Move(args)) => cmd_move(cli.file, &args),
        Some(Commands::Delete(args)) => cmd_delete(cli.file, &args),
        Some(Commands::Version) => Ok(cmd_version()),
    }
}

fn load_cfg() -> anyhow::Result<Config> {
    config::load()
}

/// Opens the board from `--file` or the configured store path.
fn open_board(cfg: &Config, file: Option<PathBuf>) -> anyhow::Result<Board> {
    let path = match file {
        Some(p) => p,
        None => cfg.store_path()?,
    };
    let store = TaskStore::load(&path)
        .with_context(|| format!("failed to open task file {}", path.display()))?
        .with_pretty(cfg.store.pretty);
    Ok(Board::new(store))
}

fn cmd_default(file: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg()?;
    let board = open_board(&cfg, file)?;

    if tui::is_tty() {
        tui::app::run(cfg, board)?;
        return Ok(ExitCode::SUCCESS);
    }

    // Non-TTY fallback: print the board once.
    write_board(&board.columns(), std::io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_board(file: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg()?;
    let board = open_board(&cfg, file)?;
    write_board(&board.columns(), std::io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_add(file: Option<PathBuf>, args: &AddArgs) -> anyhow::Result<ExitCode> {
    let date = args.date.as_deref().map(model::parse_date).transpose()?;
    let cfg = load_cfg()?;
    let mut board = open_board(&cfg, file)?;
    let task = board.add(&args.title, date)?;
    println!(
        "Task '{}' added (ID: {}, date: {})",
        task.title,
        task.id,
        model::format_date(task.date)
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(file: Option<PathBuf>, args: &ListArgs) -> anyhow::Result<ExitCode> {
    let status = args
        .status
        .as_deref()
        .map(str::parse::<Status>)
        .transpose()?;
    let cfg = load_cfg()?;
    let board = open_board(&cfg, file)?;
    let tasks = match status {
        Some(s) => board.store().query_by_status(s),
        None => board.store().tasks().to_vec(),
    };

    if args.json {
        let mut s = serde_json::to_string_pretty(&tasks)?;
        s.push('\n');
        print!("{s}");
        return Ok(ExitCode::SUCCESS);
    }

    if args.csv {
        Table::for_tasks(&tasks, false).write_csv()?;
        return Ok(ExitCode::SUCCESS);
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(ExitCode::SUCCESS);
    }
    Table::for_tasks(&tasks, cfg.ui.icons).print()?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_move(file: Option<PathBuf>, args: &MoveArgs) -> anyhow::Result<ExitCode> {
    let status: Status = args.status.parse()?;
    let cfg = load_cfg()?;
    let mut board = open_board(&cfg, file)?;
    match board.move_task(args.id, status)? {
        Outcome::Applied => {
            println!("Moved task {} to {status}", args.id);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::NotFound => {
            eprintln!("No task with ID {}", args.id);
            Ok(ExitCode::from(1))
        }
    }
}

fn cmd_delete(file: Option<PathBuf>, args: &DeleteArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg()?;
    let mut board = open_board(&cfg, file)?;

    let Some(task) = board.store().get(args.id).cloned() else {
        eprintln!("No task with ID {}", args.id);
        return Ok(ExitCode::from(1));
    };

    if cfg.board.confirm_delete && !args.yes && !confirm_delete(&task.title, task.id)? {
        println!("Aborted.");
        return Ok(ExitCode::SUCCESS);
    }

    match board.delete(task.id)? {
        Outcome::Applied => {
            println!("Deleted task {} '{}'", task.id, task.title);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::NotFound => {
            eprintln!("No task with ID {}", task.id);
            Ok(ExitCode::from(1))
        }
    }
}

fn confirm_delete(title: &str, id: u64) -> anyhow::Result<bool> {
    print!("Delete task {id} '{title}'? (y/N): ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    let _ = std::io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let resp = input.trim().to_lowercase();
    resp == "y" || resp == "yes"
}

fn cmd_version() -> ExitCode {
    println!("kanban version {}", env!("CARGO_PKG_VERSION"));
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}
