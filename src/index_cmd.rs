//! test-indexer command: persist (symbol, test method) reachability pairs.

use anyhow::Result;
use std::path::Path;

use crate::graph::{
    discover_test_classes, discover_test_methods, map_test_methods, MappingProgress, SymbolGraph,
};
use crate::storage::{IndexStorage, MappingStore};
use crate::traverse::worker_count;

/// Run the test-mapping pipeline from `source_db` into the `tests` table of
/// `target_db`.
pub fn run_index(source_db: &Path, target_db: &Path, test_namespace: &str) -> Result<()> {
    println!("[testindex] opening source db: {}", source_db.display());
    let storage = IndexStorage::open(source_db)?;
    let stats = storage.stats()?;
    println!(
        "[testindex] index: {} nodes, {} symbols, {} edges, {} files (version {})",
        stats.nodes, stats.symbols, stats.edges, stats.files, stats.version
    );

    let nodes = storage.all_nodes()?;
    let edges = storage.all_edges_brief()?;
    let graph = SymbolGraph::build(&nodes, &edges)?;
    drop(nodes);
    drop(edges);

    let class_ids = discover_test_classes(&storage, &graph, test_namespace)?;
    println!(
        "[discover-classes] done, found {} test classes in '{}'",
        class_ids.len(),
        test_namespace
    );

    // Remaining phases read only the in-memory graph.
    drop(storage);

    let workers = worker_count();
    let method_ids = discover_test_methods(&graph, &class_ids, workers);
    println!(
        "[discover-methods] found {} unique test methods across {} classes",
        method_ids.len(),
        class_ids.len()
    );

    let report = |p: &MappingProgress| {
        println!(
            "[progress] methods {}/{}, nodes visited {}, pairs discovered ~{}, unique mappings {}",
            p.methods_processed, p.total_methods, p.nodes_visited, p.pairs_discovered,
            p.unique_mappings
        );
    };
    let run = map_test_methods(&graph, &method_ids, workers, Some(&report));
    println!(
        "[testindex] collected {} mappings ({} nodes visited), writing to target db...",
        run.mappings.len(),
        run.nodes_visited
    );

    let store = MappingStore::new(target_db);
    store.ensure_schema()?;
    let inserted = store.record_mappings(&run.mappings)?;
    println!(
        "[testindex] recorded {} test mappings into {}",
        inserted,
        target_db.display()
    );

    Ok(())
}
