//! `availdb` — batch driver for the Available-Copies / SSI transaction
//! core.
//!
//! Reads a command-per-line script (a file, or stdin if the path is
//! omitted or `-`), dispatches each recognized line against a single
//! [`TransactionManager`], and prints its output the way the grammar in
//! SPEC_FULL.md §6 describes. Lines that don't match any recognized
//! shape are reported on stderr and otherwise ignored — they never
//! advance the logical clock and never stop the run.

mod format;
mod parse;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use availdb_concurrency::TransactionManager;

/// Drive the Available-Copies / SSI core from a command script.
#[derive(Parser, Debug)]
#[command(name = "availdb", version, about)]
struct Cli {
    /// Path to the command script, or `-`/omitted for stdin.
    input: Option<PathBuf>,

    /// Suppress the `dump()` variable-name header line.
    #[arg(short, long)]
    quiet: bool,

    /// Raise logging verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let reader: Box<dyn BufRead> = match &cli.input {
        None => Box::new(BufReader::new(io::stdin())),
        Some(path) if path.as_os_str() == "-" => Box::new(BufReader::new(io::stdin())),
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                eprintln!("error: could not open {}: {e}", path.display());
                process::exit(1);
            }
        },
    };

    process::exit(run(reader, cli.quiet));
}

fn run(reader: impl BufRead, quiet: bool) -> i32 {
    let mut manager = TransactionManager::new();
    let mut exit_code = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("error: {e}");
                exit_code = 1;
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        match parse::parse_line(trimmed) {
            Ok(cmd) => {
                for output in manager.dispatch(cmd) {
                    if let Some(line) = format::format_stdout(&output, quiet) {
                        println!("{line}");
                    }
                    if let Some(line) = format::format_stderr(&output) {
                        eprintln!("{line}");
                    }
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                exit_code = 1;
            }
        }
    }

    exit_code
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}
