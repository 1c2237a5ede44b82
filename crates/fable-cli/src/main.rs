//! CLI harness for the Fable narrative engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "FABLE_LOG";

#[derive(Parser)]
#[command(
    name = "fable",
    about = "Fable: pacing and world state for AI-narrated interactive fiction",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one turn of narrator output
    Turn {
        /// File with the narrator's text (`-` or omitted: stdin)
        file: Option<PathBuf>,

        /// Print the turn report as JSON
        #[arg(long)]
        json: bool,

        /// RNG seed for reproducible depth smoothing
        #[arg(long)]
        seed: Option<u64>,

        /// Do not count prose toward beat word totals
        #[arg(long)]
        no_word_count: bool,

        /// Save directory
        #[arg(short, long, default_value = ".fable")]
        dir: PathBuf,
    },

    /// Parse and validate narrator output without applying it
    Parse {
        /// File with the narrator's text (`-` or omitted: stdin)
        file: Option<PathBuf>,

        /// Save directory
        #[arg(short, long, default_value = ".fable")]
        dir: PathBuf,
    },

    /// Show the narrative state and world collections
    Status {
        /// Save directory
        #[arg(short, long, default_value = ".fable")]
        dir: PathBuf,
    },

    /// Start a new game, keeping achievements
    New {
        /// Save directory
        #[arg(short, long, default_value = ".fable")]
        dir: PathBuf,
    },

    /// Manage achievements
    Achievement {
        #[command(subcommand)]
        action: AchievementAction,

        /// Save directory
        #[arg(short, long, default_value = ".fable", global = true)]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum AchievementAction {
    /// Define a new achievement
    Define {
        /// Achievement name
        name: String,

        /// Hide it until it is completed or shown
        #[arg(long)]
        hidden: bool,
    },

    /// List visible achievements
    List,

    /// Reset completion progress
    Clear,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Turn {
            file,
            json,
            seed,
            no_word_count,
            dir,
        } => commands::turn::run(&dir, file.as_deref(), json, seed, !no_word_count),
        Commands::Parse { file, dir } => commands::parse::run(&dir, file.as_deref()),
        Commands::Status { dir } => commands::status::run(&dir),
        Commands::New { dir } => commands::new::run(&dir),
        Commands::Achievement { action, dir } => match action {
            AchievementAction::Define { name, hidden } => {
                commands::achievement::define(&dir, &name, hidden)
            }
            AchievementAction::List => commands::achievement::list(&dir),
            AchievementAction::Clear => commands::achievement::clear(&dir),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
