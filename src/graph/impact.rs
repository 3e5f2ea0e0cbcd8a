//! Test-impact analysis: reverse reachability from start symbols to test
//! classes.
//!
//! The traversal walks incoming references (who depends on the current
//! symbol), because the goal is the set of tests that exercise the
//! implementation under analysis. Outgoing OVERRIDE edges are followed too,
//! so starting from an interface method reaches the tests of its overriders.
//!
//! Every frontier entry carries the mode of the start it descends from; the
//! mode decides which edge kinds are behavioral. A method start prunes
//! MEMBER and TYPE_USAGE edges, which connect structure rather than behavior
//! and would flood the frontier with whole containers.

use anyhow::Result;
use std::collections::HashSet;

use crate::error::ResolutionError;
use crate::kinds::{EdgeKind, SymbolKind};
use crate::name::NameHierarchy;
use crate::storage::{IndexStorage, Node};
use crate::traverse::{PathQueue, NO_PARENT};

use super::lookup::{nodes_by_qualified, nodes_by_tail_name};
use super::SymbolGraph;

/// Safety bound on total enqueued frames.
pub const DEFAULT_FRAME_LIMIT: usize = 100_000;

/// One configured starting point: an optional kind filter plus a name or
/// qualified-name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSpec {
    pub kind: Option<SymbolKind>,
    pub pattern: String,
}

/// Edge-filter mode a frontier entry traverses under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartMode {
    Any,
    Kind(SymbolKind),
}

impl StartMode {
    fn from_filter(kind: Option<SymbolKind>) -> StartMode {
        match kind {
            Some(k) => StartMode::Kind(k),
            None => StartMode::Any,
        }
    }

    /// Whether an edge of this kind may be traversed under this mode.
    fn allows(self, edge: EdgeKind) -> bool {
        match self {
            StartMode::Kind(SymbolKind::Method) => {
                !matches!(edge, EdgeKind::Member | EdgeKind::TypeUsage)
            }
            _ => true,
        }
    }
}

/// Analysis parameters beyond the start specs.
#[derive(Debug, Clone)]
pub struct ImpactOptions {
    /// Name element marking the test namespace; hits must sit below it.
    pub test_namespace: String,
    /// Names and FQNs pruned from the traversal.
    pub exclude: HashSet<String>,
    /// Safety bound on total enqueued frames.
    pub frame_limit: usize,
}

impl ImpactOptions {
    pub fn new(test_namespace: &str) -> ImpactOptions {
        ImpactOptions {
            test_namespace: test_namespace.to_string(),
            exclude: HashSet::new(),
            frame_limit: DEFAULT_FRAME_LIMIT,
        }
    }
}

/// One discovered test class, in first-detection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestHit {
    pub class_id: i64,
    pub class_fqn: String,
    /// FQN chain from an original start to the class.
    pub path: Vec<String>,
}

/// Outcome of one analysis run.
#[derive(Debug)]
pub struct ImpactResult {
    /// Resolved starting symbols as `(id, fqn)` pairs, in resolution order.
    pub starts: Vec<(i64, String)>,
    pub hits: Vec<TestHit>,
    /// Distinct `(symbol, mode)` states visited.
    pub visited: usize,
    /// True when the frame limit cut the traversal short.
    pub truncated: bool,
}

/// Resolve one start spec against the index.
///
/// A pattern containing `::` resolves by qualified name: first the exact
/// serialized-name fast path, then a LIKE scan on the tail element. A plain
/// pattern resolves by tail-element name. The LIKE pattern is only a coarse
/// prefilter (`_` wildcards may over-match); results are filtered to exact
/// tail-element equality, and to the requested kind when one is set.
pub fn resolve_start_symbols(storage: &IndexStorage, spec: &StartSpec) -> Result<Vec<Node>> {
    let mut matches: Vec<Node> = if spec.pattern.contains("::") {
        nodes_by_qualified(storage, &spec.pattern)?
    } else {
        nodes_by_tail_name(storage, &spec.pattern)?
    };

    if let Some(want) = spec.kind {
        matches.retain(|node| node.symbol_kind() == want);
    }

    let mut seen = HashSet::new();
    matches.retain(|node| seen.insert(node.id));
    Ok(matches)
}

fn has_test_suffix(name: &str) -> bool {
    name.ends_with("Test") || name.ends_with("Tests")
}

/// A symbol sits in the test namespace when some element other than the last
/// equals the namespace name. The namespace node itself does not qualify.
fn in_test_namespace(name: &NameHierarchy, namespace: &str) -> bool {
    name.elements.len() > 1
        && name.elements[..name.elements.len() - 1]
            .iter()
            .any(|e| e.name == namespace)
}

fn is_excluded(name: &NameHierarchy, fqn: &str, exclude: &HashSet<String>) -> bool {
    if exclude.is_empty() {
        return false;
    }
    if exclude.contains(fqn) {
        return true;
    }
    name.elements.iter().any(|e| exclude.contains(&e.name))
}

/// Run the reverse-reachability analysis.
///
/// Start specs resolve through the storage adapter; everything after that
/// reads only the in-memory graph. A spec matching zero symbols is fatal.
///
/// Two runs over identical inputs produce identical hit order and paths: the
/// traversal is single-threaded and the frontier order is fixed by the start
/// order and the edge stream order.
pub fn run_impact_analysis(
    storage: &IndexStorage,
    graph: &SymbolGraph,
    specs: &[StartSpec],
    options: &ImpactOptions,
) -> Result<ImpactResult> {
    let mut starts: Vec<(i64, StartMode)> = Vec::new();
    let mut start_names: Vec<(i64, String)> = Vec::new();
    for spec in specs {
        let resolved = resolve_start_symbols(storage, spec)?;
        if resolved.is_empty() {
            return Err(ResolutionError::StartNotFound(spec.pattern.clone()).into());
        }
        let mode = StartMode::from_filter(spec.kind);
        for node in resolved {
            starts.push((node.id, mode));
            start_names.push((node.id, graph.fqn_of(node.id).to_string()));
        }
    }

    let mut queue: PathQueue<StartMode> = PathQueue::new();
    let mut visited: HashSet<(i64, StartMode)> = HashSet::new();
    for &(id, mode) in &starts {
        if visited.insert((id, mode)) {
            queue.push(id, 0, NO_PARENT, mode);
        }
    }

    let mut hit_ids: HashSet<i64> = HashSet::new();
    let mut hit_fqns: HashSet<String> = HashSet::new();
    let mut hits: Vec<TestHit> = Vec::new();
    let mut truncated = false;

    while let Some(index) = queue.pop_front() {
        if queue.len() >= options.frame_limit {
            truncated = true;
            break;
        }
        let frame = queue.frame(index);
        let (current, depth, mode) = (frame.symbol_id, frame.depth, frame.state);

        // Endpoint-only ids carry no name; skip them entirely.
        let Some(name) = graph.name_of(current) else {
            continue;
        };
        let fqn = graph.fqn_of(current);
        if is_excluded(name, fqn, &options.exclude) {
            continue;
        }

        if in_test_namespace(name, &options.test_namespace) {
            detect_test_class(graph, &queue, index, name, fqn, &mut hit_ids, &mut hit_fqns, &mut hits);
        }

        // Incoming edges of every kind, plus outgoing OVERRIDE edges so the
        // traversal crosses into overriders of the current symbol.
        for &(neighbor, edge) in graph.incoming(current) {
            if !mode.allows(edge) {
                continue;
            }
            if visited.insert((neighbor, mode)) {
                queue.push(neighbor, depth + 1, index, mode);
            }
        }
        for &(neighbor, edge) in graph.outgoing(current) {
            if edge != EdgeKind::Override || !mode.allows(edge) {
                continue;
            }
            if visited.insert((neighbor, mode)) {
                queue.push(neighbor, depth + 1, index, mode);
            }
        }
    }

    Ok(ImpactResult {
        starts: start_names,
        hits,
        visited: visited.len(),
        truncated,
    })
}

#[allow(clippy::too_many_arguments)]
fn detect_test_class(
    graph: &SymbolGraph,
    queue: &PathQueue<StartMode>,
    index: usize,
    name: &NameHierarchy,
    fqn: &str,
    hit_ids: &mut HashSet<i64>,
    hit_fqns: &mut HashSet<String>,
    hits: &mut Vec<TestHit>,
) {
    let kind = graph.kind_of(queue.frame(index).symbol_id);
    let mut found: Vec<(i64, String)> = Vec::new();

    match kind {
        Some(SymbolKind::Class) | Some(SymbolKind::Struct) => {
            if has_test_suffix(name.last_name()) {
                found.push((queue.frame(index).symbol_id, fqn.to_string()));
            }
        }
        Some(SymbolKind::Method) => {
            if name.elements.len() >= 2 {
                let parent_name = &name.elements[name.elements.len() - 2].name;
                if has_test_suffix(parent_name) {
                    if let Some(parent_fqn) = name.parent_qualified_name() {
                        for &class_id in graph.ids_for_fqn(&parent_fqn) {
                            if matches!(
                                graph.kind_of(class_id),
                                Some(SymbolKind::Class) | Some(SymbolKind::Struct)
                            ) {
                                found.push((class_id, parent_fqn.clone()));
                            }
                        }
                    }
                }
            }
        }
        _ => {}
    }

    for (class_id, class_fqn) in found {
        if hit_ids.contains(&class_id) || hit_fqns.contains(&class_fqn) {
            continue;
        }
        let mut path: Vec<String> = queue
            .reconstruct_path(index)
            .into_iter()
            .map(|id| graph.fqn_of(id).to_string())
            .collect();
        if path.last().map(String::as_str) != Some(class_fqn.as_str()) {
            path.push(class_fqn.clone());
        }
        hit_ids.insert(class_id);
        hit_fqns.insert(class_fqn.clone());
        hits.push(TestHit {
            class_id,
            class_fqn,
            path,
        });
    }
}
