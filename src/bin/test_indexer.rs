//! test-indexer - map every test method to the symbols it reaches
//!
//! Usage: test-indexer <source_db> <target_db> <test_namespace>

use std::path::PathBuf;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("test-indexer - record (symbol, test method) reachability mappings");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  test-indexer <source_db> <target_db> <test_namespace>");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <source_db>       Index database to read");
    eprintln!("  <target_db>       Companion database receiving the tests table");
    eprintln!("  <test_namespace>  Namespace holding the test classes");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 4 {
        print_usage();
        return ExitCode::from(1);
    }

    let source_db = PathBuf::from(&args[1]);
    let target_db = PathBuf::from(&args[2]);
    let test_namespace = &args[3];

    if let Err(e) = trailmap::index_cmd::run_index(&source_db, &target_db, test_namespace) {
        eprintln!("Error: {}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
