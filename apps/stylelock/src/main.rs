use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use stylelock_contamination::Config;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "stylelock")]
#[command(about = "Guard shared library styles against contamination", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check project stylesheets for rules that override shared library classes
    Check(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Check(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Running contamination check (using {} threads)", num_threads);

            let result = stylelock_contamination::run_contamination_check(cfg)?;
            debug!(
                "Checked {} files against {} protected class names",
                result.files_checked, result.immutable_classes
            );

            let elapsed_ms = start.elapsed().as_millis();

            if !result.reports.is_empty() {
                stylelock_contamination::print_contamination_report(&mut stdout, &result.reports)?;

                writeln!(
                    stdout,
                    "\n{} Finished in {}ms on {} files (using {} threads).",
                    "●".bright_blue(),
                    elapsed_ms.to_string().cyan(),
                    result.files_checked.to_string().cyan(),
                    num_threads.to_string().cyan()
                )?;
                stdout.flush()?;

                // Non-zero exit to fail CI
                std::process::exit(1);
            } else {
                info!("No contamination detected");
                stylelock_contamination::print_clean_message(&mut stdout, result.files_checked)?;
                writeln!(
                    stdout,
                    "\n{} Finished in {}ms on {} files (using {} threads).",
                    "●".bright_blue(),
                    elapsed_ms.to_string().cyan(),
                    result.files_checked.to_string().cyan(),
                    num_threads.to_string().cyan()
                )?;
                stdout.flush()?;
            }

            Ok(())
        }
    }
}
