//! impact-analyzer command: find test classes affected by start symbols.

use anyhow::Result;
use std::path::Path;

use crate::config::ImpactConfig;
use crate::graph::{run_impact_analysis, ImpactOptions, SymbolGraph};
use crate::storage::IndexStorage;

/// Run the test-impact analysis and print `[findtests]`-tagged results.
///
/// # Arguments
/// * `db_path` - Path to the index database
/// * `config_path` - Path to the INI-like analysis config
pub fn run_impact(db_path: &Path, config_path: &Path) -> Result<()> {
    let config = ImpactConfig::load(config_path)?;

    println!("[findtests] opening database: {}", db_path.display());
    let storage = IndexStorage::open(db_path)?;
    let stats = storage.stats()?;
    println!(
        "[findtests] index: {} nodes, {} symbols, {} edges, {} files (version {})",
        stats.nodes, stats.symbols, stats.edges, stats.files, stats.version
    );

    let nodes = storage.all_nodes()?;
    let edges = storage.all_edges_brief()?;
    let graph = SymbolGraph::build(&nodes, &edges)?;
    drop(nodes);
    drop(edges);

    let mut options = ImpactOptions::new(&config.test_namespace);
    options.exclude = config.exclude_symbols.clone();

    let result = run_impact_analysis(&storage, &graph, &config.start_symbols, &options)?;
    drop(storage);

    println!(
        "[findtests] resolved starting symbols ({}):",
        result.starts.len()
    );
    for (id, fqn) in &result.starts {
        println!("[findtests]   ID={}  FQN={}", id, fqn);
    }

    println!(
        "[findtests] traversal explored {} symbol states, found {} test classes",
        result.visited,
        result.hits.len()
    );
    for hit in &result.hits {
        println!("[findtests]   Test: {} (ID:{})", hit.class_fqn, hit.class_id);
        println!("[findtests]     path: {}", hit.path.join(" -> "));
    }
    if result.truncated {
        eprintln!("[findtests] warning: traversal limit reached, results may be incomplete");
    }

    Ok(())
}
