//! Name lookups against the index database.
//!
//! Qualified lookups first try the exact serialized-name fast path: a
//! qualified name with empty prefixes/postfixes serializes to a unique key,
//! so symbols without signatures are found by an equality query. Only when
//! that returns nothing does the LIKE scan on the tail element run, and its
//! results are filtered back to exact tail equality, so callers never see
//! non-exact matches.

use crate::error::StorageError;
use crate::name::{encode_qualified, NameHierarchy};
use crate::storage::{IndexStorage, Node};

/// Resolve a `::`-qualified pattern to nodes.
pub fn nodes_by_qualified(
    storage: &IndexStorage,
    pattern: &str,
) -> Result<Vec<Node>, StorageError> {
    let elements: Vec<&str> = pattern.split("::").collect();
    let key = encode_qualified(&elements, "::");
    let exact = storage.nodes_by_serialized_exact(&key)?;
    if !exact.is_empty() {
        return Ok(exact);
    }
    let tail = elements.last().copied().unwrap_or_default();
    let candidates = nodes_by_tail_name(storage, tail)?;
    if elements.len() == 1 {
        return Ok(candidates);
    }
    // Keep only candidates whose qualified name ends with the full pattern
    // on a delimiter boundary.
    Ok(candidates
        .into_iter()
        .filter(|node| {
            let hierarchy = NameHierarchy::decode(&node.serialized_name);
            let fqn = hierarchy.qualified_name();
            let suffix = elements.join(&hierarchy.delimiter);
            fqn == suffix || fqn.ends_with(&format!("{}{}", hierarchy.delimiter, suffix))
        })
        .collect())
}

/// Resolve a simple name to nodes whose last name element equals it.
///
/// The LIKE pattern is only a coarse prefilter (`_` wildcards may
/// over-match); decoded results are filtered to exact equality.
pub fn nodes_by_tail_name(storage: &IndexStorage, tail: &str) -> Result<Vec<Node>, StorageError> {
    if tail.is_empty() {
        return Ok(Vec::new());
    }
    let pattern = format!("%{}\ts%", tail);
    let candidates = storage.symbol_nodes_by_serialized_like(&pattern)?;
    Ok(candidates
        .into_iter()
        .filter(|node| NameHierarchy::decode(&node.serialized_name).last_name() == tail)
        .collect())
}
