//! Test-mapping indexing: which symbols does each test method reach?
//!
//! Discovery walks the structural MEMBER edges of the graph: test classes
//! are the immediate class/struct members of the test namespace whose name
//! carries a `Test`/`Tests` suffix, and test methods are their METHOD
//! members. For every test method a forward BFS over outgoing edges,
//! excluding MEMBER, collects the transitive set of reached symbols.
//!
//! The mapping phase is parallel: an atomic cursor dispenses method ids to
//! workers, each worker keeps a local visited set and a local batch of
//! `(reached_symbol, test_method)` pairs, and batches merge into one
//! mutex-guarded ordered set. The graph is shared by reference and never
//! mutated, so the BFS loops themselves take no locks.

use anyhow::Result;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ResolutionError;
use crate::kinds::{EdgeKind, SymbolKind};
use crate::storage::IndexStorage;
use crate::traverse::{SharedSet, WorkCursor, DEFAULT_BATCH_SIZE};

use super::lookup::nodes_by_qualified;
use super::SymbolGraph;

/// Classes a worker claims per cursor fetch during method discovery.
const CLASS_CHUNK: usize = 64;

/// Cadence of the progress reporter.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, Copy)]
pub struct MappingProgress {
    pub methods_processed: usize,
    pub total_methods: usize,
    pub nodes_visited: usize,
    /// Pairs appended to batches; counts duplicates the set later collapses.
    pub pairs_discovered: usize,
    pub unique_mappings: usize,
}

/// Outcome of the mapping phase.
#[derive(Debug)]
pub struct MappingRun {
    pub mappings: BTreeSet<(i64, i64)>,
    pub nodes_visited: usize,
    pub pairs_discovered: usize,
}

fn has_test_suffix(name: &str) -> bool {
    name.ends_with("Test") || name.ends_with("Tests")
}

/// Find the test classes of a namespace: its immediate class/struct members
/// with a test-suffixed name. Resolves the namespace through the storage
/// adapter; fails when it matches nothing.
///
/// # Returns
/// Sorted, de-duplicated class ids.
pub fn discover_test_classes(
    storage: &IndexStorage,
    graph: &SymbolGraph,
    namespace: &str,
) -> Result<Vec<i64>> {
    let namespace_nodes = nodes_by_qualified(storage, namespace)?;
    if namespace_nodes.is_empty() {
        return Err(ResolutionError::NamespaceNotFound(namespace.to_string()).into());
    }

    let mut class_ids: Vec<i64> = Vec::new();
    for ns in &namespace_nodes {
        for child in graph.member_children(ns.id) {
            if child == 0 {
                continue;
            }
            match graph.kind_of(child) {
                Some(SymbolKind::Class) | Some(SymbolKind::Struct) => {}
                _ => continue,
            }
            let Some(name) = graph.name_of(child) else {
                continue;
            };
            if has_test_suffix(name.last_name()) {
                class_ids.push(child);
            }
        }
    }

    class_ids.sort_unstable();
    class_ids.dedup();
    Ok(class_ids)
}

/// Find the METHOD members of the given classes, in parallel.
///
/// Workers claim chunks of [`CLASS_CHUNK`] classes from an atomic cursor and
/// flush locally collected ids to the shared vector in batches.
///
/// # Returns
/// Sorted, de-duplicated method ids.
pub fn discover_test_methods(
    graph: &SymbolGraph,
    class_ids: &[i64],
    workers: usize,
) -> Vec<i64> {
    let collected: std::sync::Mutex<Vec<i64>> = std::sync::Mutex::new(Vec::new());
    let cursor = WorkCursor::new(class_ids.len(), CLASS_CHUNK);
    let (collected_ref, cursor_ref) = (&collected, &cursor);

    thread::scope(|scope| {
        for _ in 0..workers.max(1) {
            scope.spawn(move || {
                let mut local: Vec<i64> = Vec::with_capacity(DEFAULT_BATCH_SIZE);
                while let Some(range) = cursor_ref.claim() {
                    for index in range {
                        let class_id = class_ids[index];
                        for child in graph.member_children(class_id) {
                            if child == 0 {
                                continue;
                            }
                            if graph.kind_of(child) == Some(SymbolKind::Method) {
                                local.push(child);
                            }
                        }
                        if local.len() >= DEFAULT_BATCH_SIZE {
                            collected_ref
                                .lock()
                                .expect("method list mutex poisoned")
                                .append(&mut local);
                        }
                    }
                }
                if !local.is_empty() {
                    collected_ref
                        .lock()
                        .expect("method list mutex poisoned")
                        .append(&mut local);
                }
            });
        }
    });

    let mut method_ids = collected.into_inner().expect("method list mutex poisoned");
    method_ids.sort_unstable();
    method_ids.dedup();
    method_ids
}

/// Compute the transitive reached set of every test method, in parallel.
///
/// Each worker runs a forward BFS from its claimed method over outgoing
/// edges, skipping MEMBER (structure, not behavior). Newly visited targets
/// become `(target, method)` pairs, batched into the shared ordered set.
/// The optional `progress` callback fires every 5 seconds until all workers
/// join.
pub fn map_test_methods(
    graph: &SymbolGraph,
    method_ids: &[i64],
    workers: usize,
    progress: Option<&(dyn Fn(&MappingProgress) + Sync)>,
) -> MappingRun {
    let sink: SharedSet<(i64, i64)> = SharedSet::new();
    let methods_processed = AtomicUsize::new(0);
    let nodes_visited = AtomicUsize::new(0);
    let pairs_discovered = AtomicUsize::new(0);
    let workers_done = AtomicBool::new(false);
    let cursor = WorkCursor::new(method_ids.len(), 1);

    let sink_ref = &sink;
    let (methods_ref, visited_ref, pairs_ref) = (&methods_processed, &nodes_visited, &pairs_discovered);
    let done_ref = &workers_done;
    let cursor_ref = &cursor;

    thread::scope(|scope| {
        if let Some(report) = progress {
            scope.spawn(move || {
                let mut last_tick = Instant::now();
                while !done_ref.load(Ordering::Relaxed) {
                    // Short sleeps keep the join prompt; reports stay on the
                    // 5-second cadence.
                    thread::sleep(Duration::from_millis(200));
                    if last_tick.elapsed() < PROGRESS_INTERVAL {
                        continue;
                    }
                    last_tick = Instant::now();
                    report(&MappingProgress {
                        methods_processed: methods_ref.load(Ordering::Relaxed),
                        total_methods: method_ids.len(),
                        nodes_visited: visited_ref.load(Ordering::Relaxed),
                        pairs_discovered: pairs_ref.load(Ordering::Relaxed),
                        unique_mappings: sink_ref.len(),
                    });
                }
            });
        }

        let mut handles = Vec::with_capacity(workers.max(1));
        for _ in 0..workers.max(1) {
            handles.push(scope.spawn(move || {
                let mut batch: Vec<(i64, i64)> = Vec::with_capacity(DEFAULT_BATCH_SIZE * 2);
                let mut queue: VecDeque<i64> = VecDeque::new();
                while let Some(range) = cursor_ref.claim() {
                    for index in range {
                        let method = method_ids[index];
                        let mut visited: HashSet<i64> = HashSet::new();
                        visited.insert(method);
                        queue.push_back(method);

                        while let Some(current) = queue.pop_front() {
                            visited_ref.fetch_add(1, Ordering::Relaxed);
                            for &(target, kind) in graph.outgoing(current) {
                                if kind == EdgeKind::Member || target == 0 {
                                    continue;
                                }
                                if visited.insert(target) {
                                    queue.push_back(target);
                                    batch.push((target, method));
                                    pairs_ref.fetch_add(1, Ordering::Relaxed);
                                    if batch.len() >= DEFAULT_BATCH_SIZE {
                                        sink_ref.merge(&mut batch);
                                    }
                                }
                            }
                        }

                        sink_ref.merge(&mut batch);
                        methods_ref.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }));
        }
        for handle in handles {
            let _ = handle.join();
        }
        workers_done.store(true, Ordering::Relaxed);
    });

    MappingRun {
        mappings: sink.into_inner(),
        nodes_visited: nodes_visited.into_inner(),
        pairs_discovered: pairs_discovered.into_inner(),
    }
}
