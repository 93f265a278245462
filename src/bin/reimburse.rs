//! reimburse - travel reimbursement predictor
//!
//! Command line front-end over the library: single-case prediction, batch
//! prediction and evaluation against labelled cases.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use reimburse::common::config::AppCfg;
use reimburse::common::log::{self, LogFormat};
use reimburse::data::domain::TripRecord;
use reimburse::data::repo_fs::FsCaseRepo;
use reimburse::data::service::load_unlabeled;
use reimburse::evaluation::render_report;
use reimburse::evaluation::service::evaluate_repo;
use reimburse::inference::service::{
    format_prediction, open_predictor, write_predictions, write_predictions_to,
};
use reimburse::ReimburseError;

/// reimburse - travel reimbursement predictor
#[derive(Parser, Debug)]
#[command(name = "reimburse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding model.json and feature_columns.json
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Feature profile (single_v1, batch_v2, eval_v3, train_v3 or a custom name)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict the reimbursement for one trip
    Predict {
        /// Trip length in days
        trip_duration_days: String,
        /// Miles traveled
        miles_traveled: String,
        /// Total receipts amount in dollars
        total_receipts_amount: String,
    },

    /// Predict every case in a JSON file, one line per case.
    /// Any invalid case aborts the run and nothing is written.
    Batch {
        /// JSON array of trip records
        cases: PathBuf,

        /// Write predictions here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score the model against labelled cases and print a report
    Eval {
        /// JSON array of `{"input": {...}, "expected_output": ...}` entries
        cases: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<ReimburseError>()
                .map_or(1, |e| e.code().exit_code());
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli)?;

    let format: LogFormat = cli.log_format.parse()?;
    log::init(&cfg.log_level, format);
    info!(model_dir = %cfg.model_dir.display(), profile = ?cfg.profile, "configuration loaded");

    match cli.command {
        Commands::Predict {
            trip_duration_days,
            miles_traveled,
            total_receipts_amount,
        } => {
            let record =
                TripRecord::parse(&trip_duration_days, &miles_traveled, &total_receipts_amount)?;
            let predictor = open_predictor(&cfg)?;
            let value = predictor.predict_one(&record)?;
            println!("{}", format_prediction(value));
        }
        Commands::Batch { cases, output } => {
            let batch = load_unlabeled(&FsCaseRepo::new(&cases))?;
            // Output lines must pair up with input cases, so nothing is written
            // when any case is invalid.
            if let Some(first) = batch.skipped.first() {
                let reason = first
                    .reason
                    .strip_prefix("invalid input: ")
                    .unwrap_or(&first.reason);
                return Err(ReimburseError::invalid(format!(
                    "{} of {} cases are invalid; first is case {}: {reason}",
                    batch.skipped.len(),
                    batch.total(),
                    first.index,
                ))
                .into());
            }
            let predictor = open_predictor(&cfg)?;
            let predictions = predictor.predict_all(&batch.cases)?;
            match output {
                Some(path) => write_predictions_to(&path, &predictions)?,
                None => {
                    let stdout = io::stdout();
                    write_predictions(&mut stdout.lock(), &predictions)
                        .map_err(|err| ReimburseError::io("<stdout>", err))?;
                }
            }
        }
        Commands::Eval { cases } => {
            let predictor = open_predictor(&cfg)?;
            let result = evaluate_repo(&predictor, &FsCaseRepo::new(&cases))?;
            print!("{}", render_report(&result));
        }
    }
    Ok(())
}

/// Defaults, then the TOML file and environment, then command line flags.
fn load_config(cli: &Cli) -> Result<AppCfg> {
    let mut cfg =
        AppCfg::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &cli.model_dir {
        cfg.model_dir.clone_from(dir);
    }
    if let Some(profile) = &cli.profile {
        cfg.profile = Some(profile.clone());
    }
    if let Some(level) = &cli.log_level {
        cfg.log_level.clone_from(level);
    }
    Ok(cfg)
}
