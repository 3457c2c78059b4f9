mod constructor;
mod errors;
mod parser;
mod runner;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for check results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Print results to standard output (human-readable)
    Stdout,
    /// Print one JSON document for the whole run
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "modelguard",
    version,
    about = "ModelGuard CLI - data quality checks and model report comparison",
    long_about = "ModelGuard runs data quality checks (nulls, schema, anomalies, value ranges, \
                  referential consistency) over CSV or Parquet tables described in a TOML file, \
                  and compares saved model validation reports.\n\n\
                  Example usage:\n  \
                  modelguard check --config checks.toml --output stdout\n  \
                  modelguard compare reports/model_2.0.json reports/model_1.0.json"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the checks defined in a configuration file
    Check {
        /// Path to the TOML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Output format for check results
        #[arg(short, long, value_enum, default_value = "stdout")]
        output: OutputFormat,
    },
    /// Compare the metrics of two saved validation reports
    Compare {
        /// Report of the version under review
        base: PathBuf,
        /// Report of the version to compare against
        other: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Check { config, output } => runner::run(&config, output),
        Command::Compare { base, other } => runner::compare(&base, &other).map(|_| true),
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.debug);
    let debug = args.debug;

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            if debug {
                eprintln!("Error: {:?}", err);
            } else {
                eprintln!("Error: {:#}", err);
                eprintln!("\nHint: Run with --debug flag for detailed output");
            }
            std::process::exit(2);
        }
    }
}
