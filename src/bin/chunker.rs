//! chunker - emit per-file JSON records of indexed symbols
//!
//! Usage: chunker <config.json>

use std::path::PathBuf;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("chunker - per-file code chunk extraction from a code-index database");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  chunker <config.json>");
    eprintln!();
    eprintln!("Config keys:");
    eprintln!("  db_path, project_name, project_description (optional),");
    eprintln!("  root_dir, indexed_root, chunk_output_root, paths_to_chunk");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let config_path = PathBuf::from(&args[1]);

    if let Err(e) = trailmap::chunk_cmd::run_chunker(&config_path) {
        eprintln!("Error: {}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
