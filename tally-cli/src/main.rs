use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tally_core::time::parse_tz;
use tally_core::{DerivedTask, Metrics, Priority, TaskFilter, TaskStatus};
use tally_ingest::SyntheticGenerator;
use tracing_subscriber::EnvFilter;

mod config;
mod export;
mod render;
mod session;
mod shell;
mod state;

use config::{Config, config_path, init_config, load_config};
use session::{SourceOverride, open_store};

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version = env!("TALLY_VERSION"),
    about = "Track tasks by revenue, time and ROI"
)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Load task records from this URL instead of the configured source
    #[arg(long, global = true, conflicts_with = "file")]
    url: Option<String>,

    /// Load task records from this JSON file instead of the configured source
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print tasks in ranking order
    List {
        /// Show at most this many tasks
        #[arg(long)]
        limit: Option<usize>,

        /// Only tasks with this status (todo, doing, done)
        #[arg(long)]
        status: Option<String>,

        /// Only tasks with this priority (low, medium, high)
        #[arg(long)]
        priority: Option<String>,

        /// Case-insensitive regex over title and notes
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print aggregate metrics
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// Write the ranked view as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print synthetic task records as a JSON array
    Generate {
        #[arg(long, default_value_t = 50)]
        count: usize,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Interactive shell: add, edit, delete and undo against a loaded store
    Shell,

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryOut<'a> {
    task_count: usize,
    error: Option<&'a str>,
    #[serde(flatten)]
    metrics: Metrics,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn build_filter(
    status: Option<&str>,
    priority: Option<&str>,
    search: Option<&str>,
) -> Result<TaskFilter> {
    let mut filter = TaskFilter::new();
    if let Some(s) = status {
        let status = TaskStatus::parse(s).ok_or_else(|| anyhow!("unknown status '{s}'"))?;
        filter = filter.with_status(status);
    }
    if let Some(p) = priority {
        let priority = Priority::parse(p).ok_or_else(|| anyhow!("unknown priority '{p}'"))?;
        filter = filter.with_priority(priority);
    }
    if let Some(pattern) = search {
        filter = filter.with_search(pattern)?;
    }
    Ok(filter)
}

fn report_load_error(err: Option<&str>) {
    if let Some(err) = err {
        eprintln!("warning: could not load tasks ({err}); showing generated tasks");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let over = SourceOverride {
        url: cli.url,
        file: cli.file,
    };

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => init_config()?,
            ConfigCommand::Show => {
                let cfg = load_config()?;
                println!("# {}", config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Generate { count, seed } => {
            let mut generator = match seed {
                Some(seed) => SyntheticGenerator::seeded(seed),
                None => SyntheticGenerator::new(),
            };
            let records = generator.records(count, chrono::Utc::now());
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Command::List {
            limit,
            status,
            priority,
            search,
            json,
        } => {
            let filter = build_filter(status.as_deref(), priority.as_deref(), search.as_deref())?;
            let cfg = load_config()?;
            let tz = parse_tz(&cfg.display.timezone)?;
            let store = open_store(&cfg, &over).await?;
            report_load_error(store.error());

            let rows: Vec<(usize, &DerivedTask)> = store
                .view()
                .iter()
                .enumerate()
                .map(|(i, t)| (i + 1, t))
                .filter(|(_, t)| filter.matches(t))
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            tracing::debug!(shown = rows.len(), total = store.tasks().len(), "list");

            if json {
                let tasks: Vec<&DerivedTask> = rows.iter().map(|(_, t)| *t).collect();
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if rows.is_empty() {
                println!("No tasks match.");
            } else {
                print!("{}", render::format_table(&rows, tz));
            }
        }

        Command::Summary { json } => {
            let cfg = load_config()?;
            let store = open_store(&cfg, &over).await?;
            if json {
                let out = SummaryOut {
                    task_count: store.tasks().len(),
                    error: store.error(),
                    metrics: *store.metrics(),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                report_load_error(store.error());
                print!(
                    "{}",
                    render::format_summary(store.metrics(), store.tasks().len())
                );
            }
        }

        Command::Export { out } => {
            let cfg = load_config()?;
            let store = open_store(&cfg, &over).await?;
            report_load_error(store.error());
            let n = match out {
                Some(path) => {
                    let f = File::create(&path)
                        .with_context(|| format!("create {}", path.display()))?;
                    let n = export::write_csv(store.view(), BufWriter::new(f))?;
                    eprintln!("Wrote {n} tasks to {}", path.display());
                    n
                }
                None => export::write_csv(store.view(), io::stdout().lock())?,
            };
            tracing::debug!(rows = n, "export done");
        }

        Command::Shell => run_shell(&over).await?,
    }

    Ok(())
}

async fn run_shell(over: &SourceOverride) -> Result<()> {
    let cfg: Config = load_config()?;
    let tz = parse_tz(&cfg.display.timezone)?;
    let store = open_store(&cfg, over).await?;
    report_load_error(store.error());

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} tasks loaded. Type 'help' for commands.",
        store.tasks().len()
    )?;
    let window = Duration::from_secs(cfg.display.undo_window_secs);
    let mut sh = shell::Shell::new(store, tz, window);
    sh.run(io::stdin().lock(), out)?;
    tracing::debug!(tasks = sh.store().tasks().len(), "shell exit");
    Ok(())
}
