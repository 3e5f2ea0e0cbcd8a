//! chunker command: emit per-file JSON records of located symbols.
//!
//! Database reads happen sequentially up front; file reading, slicing and
//! JSON writing then run in parallel. Graph writes do not exist here, so the
//! parallel stage shares only the read-only graph and atomic counters.

use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ChunkerConfig;
use crate::graph::{
    chunk_for_symbol, db_prefix_for_entry, file_selected, join_path, line_offsets,
    map_indexed_to_local, normalize_path, relative_to, FileChunks, SymbolGraph,
};
use crate::storage::{IndexStorage, Node, SourceLocation};

/// One selected file with everything the parallel stage needs.
struct FileTask {
    /// Recorded path, normalized.
    db_path: String,
    /// Path written into the JSON output (relative when possible).
    out_file_path: String,
    /// Candidate local paths to read, in order.
    read_candidates: Vec<String>,
    /// Where the JSON lands.
    output_path: PathBuf,
    /// Symbols located in this file with their in-file locations.
    symbols: Vec<(Node, Vec<SourceLocation>)>,
}

/// Run the chunker for the given JSON config.
pub fn run_chunker(config_path: &Path) -> Result<()> {
    let config = ChunkerConfig::load(config_path)?;
    println!("[chunker] project: {}", config.project_name);
    if let Some(description) = &config.project_description {
        println!("[chunker] description: {}", description);
    }

    println!("[chunker] opening database: {}", config.db_path);
    let storage = IndexStorage::open(&config.db_path)?;
    let stats = storage.stats()?;
    println!(
        "[chunker] index: {} nodes, {} symbols, {} edges, {} files (version {})",
        stats.nodes, stats.symbols, stats.edges, stats.files, stats.version
    );

    let prefixes: Vec<String> = config
        .paths_to_chunk
        .iter()
        .filter(|entry| !entry.is_empty())
        .map(|entry| db_prefix_for_entry(entry, &config.root_dir, &config.indexed_root))
        .collect();
    for prefix in &prefixes {
        println!("[chunker] including path prefix: {}", prefix);
    }

    let files = storage.all_files()?;
    let selected: Vec<_> = files
        .into_iter()
        .filter(|f| file_selected(&normalize_path(&f.path), &prefixes))
        .collect();
    println!("[chunker] selected {} files", selected.len());

    let nodes = storage.all_nodes()?;
    let edges = storage.all_edges_brief()?;
    let graph = SymbolGraph::build(&nodes, &edges)?;
    drop(nodes);
    drop(edges);

    // Sequential DB phase: resolve output paths, skip existing outputs, and
    // prefetch every symbol and location the parallel stage will touch.
    let mut tasks: Vec<FileTask> = Vec::with_capacity(selected.len());
    let mut skipped_existing = 0usize;
    for file in &selected {
        let db_path = normalize_path(&file.path);
        let rel = relative_to(&db_path, &config.indexed_root)
            .or_else(|| relative_to(&db_path, &config.root_dir))
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| basename(&db_path));
        let output_path = Path::new(&config.chunk_output_root).join(format!("{}.json", rel));
        if output_path.exists() {
            skipped_existing += 1;
            continue;
        }

        let mapped = map_indexed_to_local(&db_path, &config.indexed_root, &config.root_dir);
        let mut read_candidates = vec![mapped];
        if let Some(indexed_rel) = relative_to(&db_path, &config.indexed_root) {
            read_candidates.push(join_path(&config.root_dir, &indexed_rel));
        }
        read_candidates.push(db_path.clone());
        read_candidates.dedup();

        let symbols = storage.symbols_in_files(&[file.id])?;
        let mut with_locations = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let locations = storage.locations_for_symbol_in_file(symbol.id, file.id)?;
            with_locations.push((symbol, locations));
        }

        tasks.push(FileTask {
            db_path,
            out_file_path: rel,
            read_candidates,
            output_path,
            symbols: with_locations,
        });
    }
    drop(storage);
    if skipped_existing > 0 {
        println!("[chunker] skipped {} files with existing output", skipped_existing);
    }

    let written = AtomicUsize::new(0);
    let unreadable = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    tasks.par_iter().for_each(|task| {
        let Some(text) = read_first(&task.read_candidates) else {
            eprintln!(
                "[chunker] warning: cannot read source for {}, skipping",
                task.db_path
            );
            unreadable.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let offsets = line_offsets(&text);

        let chunks: Vec<_> = task
            .symbols
            .iter()
            .filter_map(|(symbol, locations)| {
                chunk_for_symbol(&graph, symbol, locations, &text, &offsets)
            })
            .collect();
        let record = FileChunks {
            file_path: task.out_file_path.clone(),
            chunks,
        };

        if let Err(e) = write_chunks(&task.output_path, &record) {
            eprintln!(
                "[chunker] warning: cannot write {}: {}",
                task.output_path.display(),
                e
            );
            failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
        written.fetch_add(1, Ordering::Relaxed);
    });

    println!(
        "[chunker] wrote {} chunk files ({} unreadable, {} failed, {} already existed)",
        written.load(Ordering::Relaxed),
        unreadable.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        skipped_existing
    );

    Ok(())
}

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn read_first(candidates: &[String]) -> Option<Vec<u8>> {
    candidates
        .iter()
        .find_map(|candidate| std::fs::read(candidate).ok())
}

fn write_chunks(output_path: &Path, record: &FileChunks) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(output_path, json)?;
    Ok(())
}
