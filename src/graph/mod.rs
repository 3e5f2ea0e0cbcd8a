//! In-memory symbol graph decoded from the index database.
//!
//! [`SymbolGraph`] materializes the node and edge streams into dense arrays
//! indexed by node id, sized by the largest id seen rather than the node
//! count. Ids are assigned densely during indexing, so the waste is small and
//! every lookup is a direct index. Id 0 is reserved for "missing"; ids that
//! appear only as edge endpoints stay traversable but carry no kind or name.
//!
//! The graph is built once, never mutated, and shared by reference across
//! traversal workers.

mod chunks;
mod impact;
mod lookup;
mod mapping;

pub use chunks::{
    chunk_for_symbol, db_prefix_for_entry, file_selected, is_absolute_path, join_path,
    line_offsets, map_indexed_to_local, normalize_path, relative_to, slice_range, ChunkRecord,
    ChunkReference, FileChunks,
};
pub use impact::{
    resolve_start_symbols, run_impact_analysis, ImpactOptions, ImpactResult, StartMode, StartSpec,
    TestHit, DEFAULT_FRAME_LIMIT,
};
pub use mapping::{
    discover_test_classes, discover_test_methods, map_test_methods, MappingProgress, MappingRun,
};

use anyhow::Result;
use std::collections::HashMap;

use crate::kinds::{EdgeKind, SymbolKind};
use crate::name::NameHierarchy;
use crate::storage::{EdgeBrief, Node};

const NO_NEIGHBORS: &[(i64, EdgeKind)] = &[];

/// Dense, read-only view of the symbol graph.
pub struct SymbolGraph {
    kinds: Vec<Option<SymbolKind>>,
    names: Vec<Option<NameHierarchy>>,
    fqns: Vec<String>,
    fqn_index: HashMap<String, Vec<i64>>,
    outgoing: Vec<Vec<(i64, EdgeKind)>>,
    incoming: Vec<Vec<(i64, EdgeKind)>>,
    node_count: usize,
    edge_count: usize,
}

impl SymbolGraph {
    /// Build the graph from full node and edge streams in one pass.
    ///
    /// Adjacency vectors preserve the order of the edge stream. Endpoints
    /// that denote no loaded node are kept traversable as missing entries; a
    /// negative id in either stream is an invariant violation.
    pub fn build(nodes: &[Node], edges: &[EdgeBrief]) -> Result<SymbolGraph> {
        let mut max_id: i64 = 0;
        for node in nodes {
            if node.id < 0 {
                anyhow::bail!("node id {} is negative", node.id);
            }
            max_id = max_id.max(node.id);
        }
        for edge in edges {
            if edge.source_id < 0 || edge.target_id < 0 {
                anyhow::bail!(
                    "edge ({}, {}) has a negative endpoint",
                    edge.source_id,
                    edge.target_id
                );
            }
            max_id = max_id.max(edge.source_id).max(edge.target_id);
        }

        let slots = (max_id as usize) + 1;
        let mut kinds: Vec<Option<SymbolKind>> = vec![None; slots];
        let mut names: Vec<Option<NameHierarchy>> = vec![None; slots];
        let mut fqns: Vec<String> = vec![String::new(); slots];
        let mut fqn_index: HashMap<String, Vec<i64>> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if node.id == 0 {
                continue;
            }
            let slot = node.id as usize;
            let hierarchy = NameHierarchy::decode(&node.serialized_name);
            let fqn = hierarchy.qualified_name();
            kinds[slot] = Some(node.symbol_kind());
            fqn_index.entry(fqn.clone()).or_default().push(node.id);
            fqns[slot] = fqn;
            names[slot] = Some(hierarchy);
        }

        let mut outgoing: Vec<Vec<(i64, EdgeKind)>> = vec![Vec::new(); slots];
        let mut incoming: Vec<Vec<(i64, EdgeKind)>> = vec![Vec::new(); slots];
        for edge in edges {
            outgoing[edge.source_id as usize].push((edge.target_id, edge.kind));
            incoming[edge.target_id as usize].push((edge.source_id, edge.kind));
        }

        Ok(SymbolGraph {
            kinds,
            names,
            fqns,
            fqn_index,
            outgoing,
            incoming,
            node_count: nodes.len(),
            edge_count: edges.len(),
        })
    }

    /// Largest node id the graph was sized for.
    pub fn max_id(&self) -> i64 {
        self.kinds.len() as i64 - 1
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn slot(&self, id: i64) -> Option<usize> {
        if id > 0 && (id as usize) < self.kinds.len() {
            Some(id as usize)
        } else {
            None
        }
    }

    /// Symbol kind of a node, or None for missing ids.
    pub fn kind_of(&self, id: i64) -> Option<SymbolKind> {
        self.slot(id).and_then(|s| self.kinds[s])
    }

    /// Decoded name hierarchy of a node.
    pub fn name_of(&self, id: i64) -> Option<&NameHierarchy> {
        self.slot(id).and_then(|s| self.names[s].as_ref())
    }

    /// Fully qualified name of a node; empty for missing ids.
    pub fn fqn_of(&self, id: i64) -> &str {
        match self.slot(id) {
            Some(s) => &self.fqns[s],
            None => "",
        }
    }

    /// Ids whose fully qualified name equals `fqn`. Collisions exist when
    /// overloads share a qualified name without signatures.
    pub fn ids_for_fqn(&self, fqn: &str) -> &[i64] {
        self.fqn_index.get(fqn).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Outgoing neighbors of a node as `(target_id, edge_kind)`.
    pub fn outgoing(&self, id: i64) -> &[(i64, EdgeKind)] {
        match self.slot(id) {
            Some(s) => &self.outgoing[s],
            None => NO_NEIGHBORS,
        }
    }

    /// Incoming neighbors of a node as `(source_id, edge_kind)`.
    pub fn incoming(&self, id: i64) -> &[(i64, EdgeKind)] {
        match self.slot(id) {
            Some(s) => &self.incoming[s],
            None => NO_NEIGHBORS,
        }
    }

    /// Outgoing MEMBER children of a container node.
    pub fn member_children(&self, id: i64) -> impl Iterator<Item = i64> + '_ {
        self.outgoing(id)
            .iter()
            .filter(|(_, kind)| *kind == EdgeKind::Member)
            .map(|(target, _)| *target)
    }
}
