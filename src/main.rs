use std::{path::Path, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use guard_governor::{
    dimacs::DimacsParser,
    driver::{self, DriverConfig, SearchOutcome},
    stats::ResourceLimits,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// File path of the DIMACS instance to explore
    #[arg(short, long)]
    pub file: String,

    /// Memory limit in megabytes (0 disables it)
    #[arg(short = 'm', long, default_value_t = 0.0)]
    pub mem_limit: f64,

    /// Time limit in seconds (0 disables it)
    #[arg(short = 't', long, default_value_t = 0.0)]
    pub time_limit: f64,

    /// How many search workers to run in parallel
    #[arg(long, default_value_t = 1)]
    pub mt: usize,

    /// Seed for the clause order of workers other than the first
    #[arg(short, long, default_value_t = 0)]
    pub seed: u64,

    /// Memory reads between two process memory refreshes
    #[arg(long, default_value_t = guard_governor::monitor::memory::SAMPLE_INTERVAL_DEFAULT)]
    pub sample_interval: u64,

    /// Log debug output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    fn config(&self) -> DriverConfig {
        DriverConfig {
            verbosity: if self.verbose {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
            limits: ResourceLimits::new(self.mem_limit, self.time_limit),
            workers: self.mt,
            seed: self.seed,
            sample_interval: self.sample_interval,
            ..Default::default()
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let cfg = args.config();

    env_logger::builder()
        .filter(None, cfg.verbosity)
        .parse_default_env()
        .init();

    info!("Config: {:#?}", cfg);

    let instance = DimacsParser::new(&args.file)?
        .parse()
        .with_context(|| format!("parsing {}", args.file))?;

    let report = driver::run(instance, &cfg)?;
    let file = Path::new(&args.file)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.clone());

    match report.outcome {
        SearchOutcome::Finished { status, steps, .. } => {
            println!(
                "[{}] Status: {}\tSteps: {}\tElapsed: {:#?}",
                file, status, steps, report.elapsed
            );
            Ok(ExitCode::SUCCESS)
        }
        SearchOutcome::Aborted(e) => {
            println!("[{}] Aborted: {}\tElapsed: {:#?}", file, e, report.elapsed);
            Ok(ExitCode::from(2))
        }
    }
}
