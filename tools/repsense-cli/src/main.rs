//! RepSense CLI — Command-line interface for exercise catalogs and recordings.
//!
//! Usage:
//!   repsense list                              List catalog exercises
//!   repsense validate <CATALOG>                Validate a catalog file
//!   repsense replay <FRAMES> --exercise <ID>   Replay a landmark recording
//!   repsense calories --exercise <ID> ...      Evaluate a calorie formula

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use repsense_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "repsense",
    about = "Exercise repetition counting from pose landmarks",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Exercise catalog file (defaults to the configured or built-in catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the exercises in the catalog
    List,

    /// Validate an exercise catalog file
    Validate {
        /// Path to the catalog JSON
        path: PathBuf,
    },

    /// Replay a JSONL landmark recording through the rep counter
    Replay {
        /// Path to the frames file (one JSON frame per line)
        path: PathBuf,

        /// Exercise ID to count
        #[arg(short, long)]
        exercise: String,

        /// Emit one JSON object per frame and a JSON summary
        #[arg(long)]
        json: bool,

        /// Body weight in grams (defaults to the configured value)
        #[arg(long)]
        body_weight: Option<f64>,

        /// Extra formula variable, e.g. `--var weight=5000`
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },

    /// Evaluate an exercise's calorie formula
    Calories {
        /// Exercise ID
        #[arg(short, long)]
        exercise: String,

        /// Completed repetitions
        #[arg(long, default_value = "0")]
        reps: u32,

        /// Session length in minutes
        #[arg(long, default_value = "0")]
        minutes: f64,

        /// Body weight in grams (defaults to the configured value)
        #[arg(long)]
        body_weight: Option<f64>,

        /// Extra formula variable, e.g. `--var weight=5000`
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    repsense_common::logging::init_logging(&config.logging);

    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog);
    }

    match cli.command {
        Commands::List => commands::list::run(&config),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Replay {
            path,
            exercise,
            json,
            body_weight,
            vars,
        } => commands::replay::run(&config, path, exercise, json, body_weight, vars),
        Commands::Calories {
            exercise,
            reps,
            minutes,
            body_weight,
            vars,
        } => commands::calories::run(&config, exercise, reps, minutes, body_weight, vars),
    }
}
