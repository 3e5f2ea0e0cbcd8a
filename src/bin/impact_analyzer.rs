//! impact-analyzer - find test classes affected by a set of start symbols
//!
//! Usage: impact-analyzer <db_path> <config_path>

use std::path::PathBuf;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("impact-analyzer - test-impact analysis over a code-index database");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  impact-analyzer <db_path> <config_path>");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <db_path>       Path to the index database");
    eprintln!("  <config_path>   INI-like config with [test_namespace],");
    eprintln!("                  [start_symbols] and [exclude_symbols] sections");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 3 {
        print_usage();
        return ExitCode::from(1);
    }

    let db_path = PathBuf::from(&args[1]);
    let config_path = PathBuf::from(&args[2]);

    if let Err(e) = trailmap::impact_cmd::run_impact(&db_path, &config_path) {
        eprintln!("Error: {}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
