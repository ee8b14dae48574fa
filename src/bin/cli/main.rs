mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "kanjilearner-cli", about = "Kanji SRS lessons and reviews", version)]
struct Cli {
    /// Directory holding catalog.json, config.toml and srs.db
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this user (default: the local user of the data directory)
    #[arg(long, global = true)]
    user: Option<Uuid>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Set up a new user: every level 0 item starts burned
    Init,

    /// Add an item to your lessons, planning its prerequisites first
    Plan {
        /// Item id or literal
        item: String,
    },

    /// List available lessons
    Lessons {
        /// Maximum lessons to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Finish the lesson for an item and schedule its first review
    Start {
        /// Item id or literal
        item: String,
    },

    /// List reviews that are due now
    Reviews,

    /// Answer a review
    Review {
        /// Item id or literal
        item: String,
        #[arg(long, conflicts_with = "wrong", required_unless_present = "wrong")]
        correct: bool,
        #[arg(long)]
        wrong: bool,
    },

    /// List items waiting on prerequisites
    Planned,

    /// List mistakes from the last day
    Mistakes,

    /// Show upcoming reviews per hour
    Forecast {
        /// IANA timezone, e.g. Europe/Berlin
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Find items by character or meaning
    Search {
        /// Text to look for (case-insensitive)
        query: String,
        /// Maximum results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show an item and your progress on it
    Show {
        /// Item id or literal
        item: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let app = app::App::new(cli.data_dir.as_deref(), cli.user)?;

    match cli.command {
        Command::Init => {
            commands::init::run(&app, &cli.format)?;
        }
        Command::Plan { item } => {
            commands::plan::run_plan(&app, &item, &cli.format, use_color)?;
        }
        Command::Lessons { limit } => {
            commands::lessons::run_list(&app, limit, &cli.format, use_color)?;
        }
        Command::Start { item } => {
            commands::lessons::run_start(&app, &item, &cli.format, use_color)?;
        }
        Command::Reviews => {
            commands::reviews::run_list(&app, &cli.format, use_color)?;
        }
        Command::Review { item, correct, wrong } => {
            commands::reviews::run_answer(&app, &item, correct && !wrong, &cli.format, use_color)?;
        }
        Command::Planned => {
            commands::plan::run_list(&app, &cli.format, use_color)?;
        }
        Command::Mistakes => {
            commands::mistakes::run(&app, &cli.format, use_color)?;
        }
        Command::Forecast { tz } => {
            commands::forecast::run(&app, &tz, &cli.format)?;
        }
        Command::Search { query, limit } => {
            commands::search::run(&app, &query, limit, &cli.format, use_color)?;
        }
        Command::Show { item } => {
            commands::show::run(&app, &item, &cli.format, use_color)?;
        }
    }

    Ok(())
}
