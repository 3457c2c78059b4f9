use std::path::Path;

use anyhow::{Context, Result};
use modelguard_core::CheckRunner;
use modelguard_reports::{JsonFormatter, ReportStore, Reporter, StdOutFormatter};

use crate::constructor::{construct_check, construct_consistency, load};
use crate::parser::{parse_config, Config};
use crate::OutputFormat;

/// Run the configured checks. Returns whether every check passed.
pub fn run(config_path: &Path, output: OutputFormat) -> Result<bool> {
    let config = parse_config(config_path)?;
    let version = env!("CARGO_PKG_VERSION");

    match output {
        OutputFormat::Stdout => {
            let mut formatter = StdOutFormatter::new(version);
            execute(&config, &mut formatter)
        }
        OutputFormat::Json => {
            let mut formatter = JsonFormatter::new(version);
            let passed = execute(&config, &mut formatter)?;
            println!("{}", formatter.to_json()?);
            Ok(passed)
        }
    }
}

fn execute<R: Reporter>(config: &Config, reporter: &mut R) -> Result<bool> {
    let mut runner = CheckRunner::new(&config.results_dir);

    reporter.on_start();
    let n_table = config.table.len();
    for (i, t) in config.table.iter().enumerate() {
        reporter.on_table_load(i + 1, n_table, &t.name);
        runner.add_table(t.name.clone(), load(t)?);
        for check in &t.check {
            let check = construct_check(&t.name, check)
                .with_context(|| format!("Invalid check for table: '{}'", t.name))?;
            runner.add_check(t.name.clone(), check);
        }
    }
    for c in &config.consistency {
        runner.add_consistency(construct_consistency(c, &config.table)?);
    }

    reporter.on_run_start();
    let outputs = runner
        .run()
        .with_context(|| format!("Failed to write results to '{}'", config.results_dir))?;
    for output in &outputs {
        reporter.on_check_result(output);
    }
    let passed = outputs.iter().filter(|o| o.result.is_passed()).count();
    let failed = outputs.len() - passed;
    reporter.on_summary(passed, failed);

    Ok(failed == 0)
}

/// Print the delta between two saved report snapshots.
pub fn compare(base: &Path, other: &Path) -> Result<()> {
    let comparison = ReportStore::compare_files(base, other).with_context(|| {
        format!(
            "Failed to compare '{}' with '{}'",
            base.display(),
            other.display()
        )
    })?;
    println!("{}", serde_json::to_string_pretty(&comparison)?);
    Ok(())
}
