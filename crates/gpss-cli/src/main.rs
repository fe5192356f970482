//! `gpss`: run a model file and print its report.

use clap::{ArgAction, Parser};
use gpss_cli::{Session, SessionError};
use gpss_core::sim::SimConfig;
use gpss_model::load_config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gpss")]
#[command(version, about = "Run a GPSS model and print the report", long_about = None)]
struct Cli {
    /// Model file.
    model: PathBuf,

    /// Run configuration (.toml, .ron or .json).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for every random family.
    #[arg(long)]
    seed: Option<u64>,

    /// Termination count. Overrides START and the configuration file.
    #[arg(short = 'n', long)]
    termination_count: Option<i64>,

    /// Stop once the clock passes this time.
    #[arg(short, long)]
    target_time: Option<i64>,

    /// Trace every transaction.
    #[arg(long)]
    trace_all: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(false) => ExitCode::SUCCESS,
        // The run finished but discarded transactions.
        Ok(true) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether the run was degraded.
fn run(cli: &Cli) -> Result<bool, SessionError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.target_time.is_some() {
        config.target_time = cli.target_time;
    }
    config.trace_all |= cli.trace_all;

    let text = std::fs::read_to_string(&cli.model)?;
    let mut session = Session::new(config);
    let report = session.run(&text, cli.termination_count)?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(report.degraded)
}
