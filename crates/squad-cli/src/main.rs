mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, decisions::DecisionsSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "squad",
    about = "Read-only view of a squad's members, tasks, logs, and decisions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .ai-team/ or .git/)
    #[arg(long, global = true, env = "SQUAD_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List team members with their current status
    Members,

    /// List tasks derived from logs
    Tasks {
        /// Read every log directory instead of only the orchestration log
        #[arg(long)]
        all: bool,

        /// Only tasks assigned to this member
        #[arg(long)]
        member: Option<String>,

        /// Only tasks with this status (pending, in_progress, completed)
        #[arg(long)]
        status: Option<String>,
    },

    /// List parsed log entries
    Logs {
        /// Read every log directory instead of only the orchestration log
        #[arg(long)]
        all: bool,
    },

    /// List and search recorded decisions
    Decisions {
        #[command(subcommand)]
        subcommand: DecisionsSubcommand,
    },

    /// Completed tasks per day across all logs
    Velocity {
        /// Number of days ending today (1 to 3660)
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=3660))]
        days: u32,
    },

    /// Members, task summary, and decision count in one view
    Overview,

    /// Show or validate the squad configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Members => cmd::members::run(&root, cli.json),
        Commands::Tasks {
            all,
            member,
            status,
        } => cmd::tasks::run(&root, all, member.as_deref(), status.as_deref(), cli.json),
        Commands::Logs { all } => cmd::logs::run(&root, all, cli.json),
        Commands::Decisions { subcommand } => cmd::decisions::run(&root, subcommand, cli.json),
        Commands::Velocity { days } => cmd::velocity::run(&root, days, cli.json),
        Commands::Overview => cmd::overview::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
