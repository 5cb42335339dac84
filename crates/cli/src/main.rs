// matplan CLI - maintenance material planning reconciliation

mod exit_codes;
mod inputs;
mod predict;
mod report;
mod tables;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use matplan_io::LoadError;
use matplan_predict::PredictError;
use matplan_recon::analysis::Period;
use matplan_recon::ReconError;

use exit_codes::{
    EXIT_ERROR, EXIT_INSUFFICIENT_DATA, EXIT_INVALID_CONFIG, EXIT_LOAD, EXIT_MODEL_INVALID, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "matplan")]
#[command(about = "Reconcile planned and consumed material on aircraft maintenance work packages")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the enriched master view of all work packages
    #[command(after_help = "\
Examples:
  matplan master matplan.toml
  matplan master matplan.toml --json > master.json
  matplan master matplan.toml --output master.csv")]
    Master {
        /// Path to the matplan.toml config file
        config: PathBuf,

        /// Print the master view as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the master view to a file (.csv for flat CSV, otherwise JSON)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Data completeness and consumption category statistics
    Stats {
        config: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Report which input table each file holds
    #[command(after_help = "\
Examples:
  matplan detect maintenance_workpacks.xlsx material_consumption.csv")]
    Detect {
        /// CSV/TSV or Excel files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a config file without loading any table
    Validate { config: PathBuf },

    /// Planning accuracy and consumption per maintenance station
    Stations {
        config: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Planning accuracy of C-checks over time
    Trend {
        config: PathBuf,

        /// Grouping period: month, quarter or year
        #[arg(long, default_value = "month")]
        period: Period,

        #[arg(long)]
        json: bool,
    },

    /// Part-by-part planned vs consumed material for one work package
    #[command(after_help = "\
Examples:
  matplan parts matplan.toml --wp 1002")]
    Parts {
        config: PathBuf,

        /// Work package key (wpno_i)
        #[arg(long = "wp")]
        wp: String,

        #[arg(long)]
        json: bool,
    },

    /// Train the material predictor on historical C-checks
    #[command(after_help = "\
Examples:
  matplan train matplan.toml --model model.json")]
    Train {
        config: PathBuf,

        /// Where to save the trained model (JSON)
        #[arg(long)]
        model: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Predict material demand for an upcoming C-check
    #[command(after_help = "\
Examples:
  matplan predict matplan.toml --model model.json --ac-type A320N --station CPH --planned-parts 120")]
    Predict {
        config: PathBuf,

        /// Model saved by `matplan train`
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        check: predict::CheckArgs,

        /// Number of similar historical checks to list
        #[arg(long, default_value_t = 5)]
        similar: usize,

        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")",
        "\ntarget:  ",
        env!("TARGET"),
    )
}

/// stderr subscriber; `log` records from the library crates are bridged in.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Master { config, json, output } => report::cmd_master(config, json, output),
        Commands::Stats { config, json } => report::cmd_stats(config, json),
        Commands::Detect { files, json } => tables::cmd_detect(files, json),
        Commands::Validate { config } => tables::cmd_validate(config),
        Commands::Stations { config, json } => report::cmd_stations(config, json),
        Commands::Trend { config, period, json } => report::cmd_trend(config, period, json),
        Commands::Parts { config, wp, json } => report::cmd_parts(config, wp, json),
        Commands::Train { config, model, json } => predict::cmd_train(config, model, json),
        Commands::Predict {
            config,
            model,
            check,
            similar,
            json,
        } => predict::cmd_predict(config, model, check, similar, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_LOAD, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        match err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Self::new(EXIT_INVALID_CONFIG, err.to_string())
            }
            ReconError::Unavailable(table) => Self::io(err.to_string())
                .with_hint(format!("set the {table} file under [tables] in the config")),
            ReconError::Serialize(_) => Self::general(err.to_string()),
        }
    }
}

impl From<LoadError> for CliError {
    fn from(err: LoadError) -> Self {
        let hint = match &err {
            LoadError::WrongKind { .. } | LoadError::MissingColumns { .. } => {
                Some("run `matplan detect <file>` to see what the file contains")
            }
            _ => None,
        };
        let out = Self::io(err.to_string());
        match hint {
            Some(h) => out.with_hint(h),
            None => out,
        }
    }
}

impl From<PredictError> for CliError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InsufficientData { .. } => Self::new(EXIT_INSUFFICIENT_DATA, err.to_string())
                .with_hint("add more C-checks with matched consumption, or lower predictor.min_training_samples"),
            PredictError::ModelIo { .. } => Self::io(err.to_string()),
            PredictError::ModelFormat { .. } | PredictError::FeatureMismatch { .. } => {
                Self::new(EXIT_MODEL_INVALID, err.to_string())
                    .with_hint("retrain with `matplan train <config> --model <file>`")
            }
        }
    }
}
