use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use task_schedule_optimizer::services::schedule_utils;
use task_schedule_optimizer::utils::logger;
use task_schedule_optimizer::{
    AppResult, LoggingConfig, OptimizationRequest, OptimizerConfig, ScheduleOptimizer,
};
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "schedule-optimizer",
    version,
    about = "Places tasks into time slots around calendar constraints"
)]
struct Cli {
    /// Also write logs to a daily rolling file in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Optimizes the request and writes the resulting schedule as JSON.
    Optimize {
        /// Optimization request (JSON).
        #[arg(long)]
        input: PathBuf,
        /// Optimizer config (JSON or YAML, chosen by extension).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the time budget, in milliseconds.
        #[arg(long)]
        budget_ms: Option<u64>,
        /// RFC 3339 planning start; defaults to the request's or now.
        #[arg(long)]
        start: Option<String>,
        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Checks a request for malformed input without optimizing it.
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        directives: None,
        log_dir: cli.log_dir.clone(),
    };
    if let Err(err) = logger::init_logging(&logging) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "app::cli", error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> AppResult<()> {
    match command {
        Commands::Optimize {
            input,
            config,
            budget_ms,
            start,
            output,
        } => {
            let mut request = read_request(&input)?;
            if let Some(raw) = start {
                request.planning_start = Some(schedule_utils::parse_datetime(&raw)?);
            }
            if budget_ms.is_some() {
                request.time_budget_ms = budget_ms;
            }
            request.validate()?;

            let config = match config {
                Some(path) => OptimizerConfig::load(path)?,
                None => OptimizerConfig::default(),
            };
            let schedule = ScheduleOptimizer::new(config).optimize(&request);
            let rendered = serde_json::to_string_pretty(&schedule)?;

            match output {
                Some(path) => fs::write(path, rendered)?,
                None => println!("{rendered}"),
            }
            Ok(())
        }
        Commands::Validate { input } => {
            let request = read_request(&input)?;
            request.validate()?;
            println!("{} tasks, {} constraints: ok", request.tasks.len(), request.constraints.len());
            Ok(())
        }
    }
}

fn read_request(path: &Path) -> AppResult<OptimizationRequest> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
