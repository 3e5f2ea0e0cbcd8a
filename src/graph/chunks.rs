//! Per-file code chunking: slicing symbol scopes out of source text.
//!
//! The index records paths as the indexer saw them, which may be a different
//! filesystem (or platform) than the one the chunker runs on. Path handling
//! therefore stays in plain string space: normalize separators, translate
//! between the indexed root and the local root, and compare by prefix.
//!
//! Source ranges are 1-based with an inclusive end column. An end column of
//! zero means "through the end of the end line", which maps to the start of
//! the following line in the offset table.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::kinds::{format_edge_kind, format_symbol_kind, LocationKind};
use crate::name::NameHierarchy;
use crate::storage::{Node, SourceLocation};

use super::SymbolGraph;

/// One outgoing relation of a chunked symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkReference {
    pub kind: String,
    pub target_id: i64,
}

/// One symbol located in a file, with its sliced source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkRecord {
    pub symbol_id: i64,
    pub kind: String,
    pub fully_qualified_name: String,
    pub name: String,
    pub start_line: i64,
    pub start_col: i64,
    pub end_line: i64,
    pub end_col: i64,
    pub code_chunk: String,
    /// SHA-256 of the chunk text, hex encoded.
    pub content_hash: String,
    pub references: Vec<ChunkReference>,
}

/// The per-file output object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChunks {
    pub file_path: String,
    pub chunks: Vec<ChunkRecord>,
}

/// Unify separators to `/` and trim trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let mut out = path.replace('\\', "/");
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Absolute in either path space: POSIX, UNC-like, or a Windows drive.
pub fn is_absolute_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    if bytes[0] == b'/' || bytes[0] == b'\\' {
        return true;
    }
    bytes.len() > 1 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Join a base and a relative part in normalized form; an absolute `rel`
/// wins.
pub fn join_path(base: &str, rel: &str) -> String {
    if base.is_empty() {
        return rel.to_string();
    }
    if rel.is_empty() {
        return base.to_string();
    }
    let base = normalize_path(base);
    let rel = normalize_path(rel);
    if is_absolute_path(&rel) {
        return rel;
    }
    format!("{}/{}", base.trim_end_matches('/'), rel)
}

/// The part of `path` below `root`, or None when it does not lie under it.
pub fn relative_to(path: &str, root: &str) -> Option<String> {
    if root.is_empty() {
        return None;
    }
    let path = normalize_path(path);
    let root = normalize_path(root);
    if path == root {
        return Some(String::new());
    }
    let prefix = format!("{}/", root);
    path.strip_prefix(&prefix).map(str::to_string)
}

/// Map a recorded (indexed-space) file path to a local path.
///
/// Paths outside the indexed root pass through unchanged.
pub fn map_indexed_to_local(db_path: &str, indexed_root: &str, local_root: &str) -> String {
    let db_path = normalize_path(db_path);
    let indexed = normalize_path(indexed_root);
    let local = normalize_path(local_root);
    if indexed.is_empty() {
        return db_path;
    }
    if db_path == indexed {
        return local;
    }
    match relative_to(&db_path, &indexed) {
        Some(rel) => join_path(&local, &rel),
        None => db_path,
    }
}

/// Translate one configured path entry into an indexed-space prefix.
///
/// A relative entry joins with the indexed root (falling back to the local
/// root). An absolute entry under the local root is translated to the
/// indexed root; other absolute entries are assumed to already be in indexed
/// space. A POSIX-absolute entry is treated as relative when the indexed
/// root is a Windows drive, so configs written on the reader's side keep
/// working against a Windows-indexed database.
pub fn db_prefix_for_entry(entry: &str, local_root: &str, indexed_root: &str) -> String {
    let entry = normalize_path(entry);
    let local = normalize_path(local_root);
    let indexed = normalize_path(indexed_root);

    let entry_is_posix_abs = entry.starts_with('/');
    let indexed_is_win_drive = {
        let bytes = indexed.as_bytes();
        bytes.len() > 1 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
    };

    if is_absolute_path(&entry) {
        // Under the local root: translate local -> indexed.
        if let Some(rel) = relative_to(&entry, &local) {
            if indexed.is_empty() {
                return entry;
            }
            return normalize_path(&join_path(&indexed, &rel));
        }
        // A POSIX-absolute entry against a Windows-indexed database reads as
        // indexed-relative; any other absolute entry is already indexed space.
        if !(entry_is_posix_abs && indexed_is_win_drive) {
            return entry;
        }
    }

    let rel = if entry_is_posix_abs && indexed_is_win_drive {
        entry.trim_start_matches('/').to_string()
    } else {
        entry
    };
    if indexed.is_empty() {
        normalize_path(&join_path(&local, &rel))
    } else {
        normalize_path(&join_path(&indexed, &rel))
    }
}

/// Whether a normalized file path falls under any of the prefixes. An empty
/// prefix list selects everything.
pub fn file_selected(path: &str, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    prefixes.iter().any(|prefix| {
        path == prefix || (!prefix.is_empty() && path.starts_with(&format!("{}/", prefix)))
    })
}

/// Byte offsets of every line start, with a sentinel equal to the text
/// length.
pub fn line_offsets(text: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(128);
    offsets.push(0);
    for (index, byte) in text.iter().enumerate() {
        if *byte == b'\n' {
            offsets.push(index + 1);
        }
    }
    offsets.push(text.len());
    offsets
}

/// Byte range of a 1-based source range with inclusive end column.
///
/// `end_col == 0` ends at the start of the line after `end_line`. Both ends
/// clamp to the text length and the range never inverts.
pub fn slice_range(
    offsets: &[usize],
    text_len: usize,
    start_line: i64,
    start_col: i64,
    end_line: i64,
    end_col: i64,
) -> (usize, usize) {
    let line_start = |line: i64| -> usize {
        if line <= 0 {
            return 0;
        }
        offsets
            .get((line - 1) as usize)
            .copied()
            .unwrap_or(text_len)
    };

    let mut start = line_start(start_line);
    if start_col > 0 {
        start += (start_col - 1) as usize;
    }
    let mut end = if end_col > 0 {
        line_start(end_line) + end_col as usize
    } else {
        offsets.get(end_line as usize).copied().unwrap_or(text_len)
    };

    start = start.min(text_len);
    end = end.min(text_len);
    if end < start {
        end = start;
    }
    (start, end)
}

/// Build the chunk record for one symbol, or None when the file holds no
/// SCOPE or TOKEN location for it.
///
/// The scope location spans the full definition including the body; a
/// symbol with only a TOKEN (e.g. a field) is sliced at that token.
pub fn chunk_for_symbol(
    graph: &SymbolGraph,
    symbol: &Node,
    locations: &[SourceLocation],
    text: &[u8],
    offsets: &[usize],
) -> Option<ChunkRecord> {
    let location = locations
        .iter()
        .find(|l| l.kind == LocationKind::Scope)
        .or_else(|| locations.iter().find(|l| l.kind == LocationKind::Token))?;

    let (start, end) = slice_range(
        offsets,
        text.len(),
        location.start_line,
        location.start_col,
        location.end_line,
        location.end_col,
    );
    let code_chunk = String::from_utf8_lossy(&text[start..end]).into_owned();
    let content_hash = hex::encode(Sha256::digest(code_chunk.as_bytes()));

    let hierarchy = NameHierarchy::decode(&symbol.serialized_name);
    let references = graph
        .outgoing(symbol.id)
        .iter()
        .map(|&(target_id, kind)| ChunkReference {
            kind: format_edge_kind(kind).to_string(),
            target_id,
        })
        .collect();

    Some(ChunkRecord {
        symbol_id: symbol.id,
        kind: format_symbol_kind(symbol.symbol_kind()).to_string(),
        fully_qualified_name: hierarchy.qualified_name_with_signature(),
        name: hierarchy.last_name().to_string(),
        start_line: location.start_line,
        start_col: location.start_col,
        end_line: location.end_line,
        end_col: location.end_col,
        code_chunk,
        content_hash,
        references,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{EdgeKind, SymbolKind};
    use crate::name::encode_qualified;
    use crate::storage::EdgeBrief;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a\\b\\c"), "a/b/c");
        assert_eq!(normalize_path("a/b/"), "a/b");
        assert_eq!(normalize_path("a/b///"), "a/b");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("C:\\src\\"), "C:/src");
    }

    #[test]
    fn test_is_absolute_path() {
        assert!(is_absolute_path("/usr/src"));
        assert!(is_absolute_path("C:/src"));
        assert!(is_absolute_path("C:\\src"));
        assert!(is_absolute_path("\\\\share"));
        assert!(!is_absolute_path("src/lib"));
        assert!(!is_absolute_path(""));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/root", "src/a.cc"), "/root/src/a.cc");
        assert_eq!(join_path("/root/", "src"), "/root/src");
        assert_eq!(join_path("", "src"), "src");
        assert_eq!(join_path("/root", "/abs/p"), "/abs/p");
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("/r/src/a.cc", "/r").as_deref(), Some("src/a.cc"));
        assert_eq!(relative_to("/r", "/r").as_deref(), Some(""));
        assert_eq!(relative_to("/other/a.cc", "/r"), None);
        assert_eq!(relative_to("Z:/mcb/x.cpp", "Z:/mcb").as_deref(), Some("x.cpp"));
    }

    #[test]
    fn test_map_indexed_to_local() {
        assert_eq!(
            map_indexed_to_local("Z:/mcb/src/a.cpp", "Z:/mcb", "/home/me/mcb"),
            "/home/me/mcb/src/a.cpp"
        );
        assert_eq!(map_indexed_to_local("Z:/mcb", "Z:/mcb", "/local"), "/local");
        // Outside the indexed root: passes through normalized.
        assert_eq!(
            map_indexed_to_local("Y:\\elsewhere\\b.cpp", "Z:/mcb", "/local"),
            "Y:/elsewhere/b.cpp"
        );
        assert_eq!(map_indexed_to_local("/p/a.cc", "", "/local"), "/p/a.cc");
    }

    #[test]
    fn test_db_prefix_for_entry() {
        // Relative entry joins the indexed root.
        assert_eq!(
            db_prefix_for_entry("src/core", "/home/me/mcb", "Z:/mcb"),
            "Z:/mcb/src/core"
        );
        // Absolute under the local root translates to indexed space.
        assert_eq!(
            db_prefix_for_entry("/home/me/mcb/src/core", "/home/me/mcb", "Z:/mcb"),
            "Z:/mcb/src/core"
        );
        // POSIX-absolute against a Windows indexed root reads as relative.
        assert_eq!(
            db_prefix_for_entry("/src/core", "/home/me/mcb", "Z:/mcb"),
            "Z:/mcb/src/core"
        );
        // Absolute outside the local root is already indexed space.
        assert_eq!(
            db_prefix_for_entry("Q:/other/dir", "/home/me/mcb", "Z:/mcb"),
            "Q:/other/dir"
        );
        // No indexed root: relative entries join the local root.
        assert_eq!(
            db_prefix_for_entry("src", "/home/me/mcb", ""),
            "/home/me/mcb/src"
        );
    }

    #[test]
    fn test_file_selected() {
        let prefixes = vec!["Z:/mcb/src".to_string()];
        assert!(file_selected("Z:/mcb/src", &prefixes));
        assert!(file_selected("Z:/mcb/src/a.cpp", &prefixes));
        assert!(!file_selected("Z:/mcb/srcx/a.cpp", &prefixes));
        assert!(!file_selected("Z:/mcb/other/a.cpp", &prefixes));
        assert!(file_selected("anything", &[]));
    }

    #[test]
    fn test_line_offsets() {
        let text = b"int x;\nvoid y(){}\n";
        assert_eq!(line_offsets(text), vec![0, 7, 18, 18]);
        assert_eq!(line_offsets(b""), vec![0, 0]);
        assert_eq!(line_offsets(b"one line"), vec![0, 8]);
    }

    #[test]
    fn test_slice_range_inclusive_end_column() {
        let text = b"int x;\nvoid y(){}\n";
        let offsets = line_offsets(text);
        // Columns 1..=10 of line 2.
        let (start, end) = slice_range(&offsets, text.len(), 2, 1, 2, 10);
        assert_eq!(&text[start..end], b"void y(){}");
        // Column 11 is the newline; inclusive end keeps it.
        let (start, end) = slice_range(&offsets, text.len(), 2, 1, 2, 11);
        assert_eq!(&text[start..end], b"void y(){}\n");
        assert_eq!(end - start, 11);
    }

    #[test]
    fn test_slice_range_zero_end_column_spans_whole_line() {
        let text = b"int x;\nvoid y(){}\nint z;\n";
        let offsets = line_offsets(text);
        let (start, end) = slice_range(&offsets, text.len(), 2, 1, 2, 0);
        assert_eq!(&text[start..end], b"void y(){}\n");
    }

    #[test]
    fn test_slice_range_clamps_out_of_bounds() {
        let text = b"short\n";
        let offsets = line_offsets(text);
        let (start, end) = slice_range(&offsets, text.len(), 1, 1, 9, 50);
        assert_eq!((start, end), (0, text.len()));
        // Inverted input collapses to an empty range.
        let (start, end) = slice_range(&offsets, text.len(), 1, 5, 1, 1);
        assert_eq!(start, end);
        // Zero columns are tolerated.
        let (start, end) = slice_range(&offsets, text.len(), 1, 0, 1, 0);
        assert_eq!(&text[start..end], b"short\n");
    }

    fn graph_with_symbol() -> (SymbolGraph, Node) {
        let symbol = Node {
            id: 2,
            node_kind: SymbolKind::Function.to_node_kind(),
            serialized_name: encode_qualified(&["y"], "::"),
        };
        let nodes = vec![symbol.clone()];
        let edges = vec![EdgeBrief {
            source_id: 2,
            target_id: 7,
            kind: EdgeKind::Call,
        }];
        (SymbolGraph::build(&nodes, &edges).unwrap(), symbol)
    }

    fn location(kind: LocationKind, range: (i64, i64, i64, i64)) -> SourceLocation {
        SourceLocation {
            id: 1,
            file_id: 1,
            start_line: range.0,
            start_col: range.1,
            end_line: range.2,
            end_col: range.3,
            kind,
        }
    }

    #[test]
    fn test_chunk_for_symbol_prefers_scope_over_token() {
        let (graph, symbol) = graph_with_symbol();
        let text = b"int x;\nvoid y(){}\n";
        let offsets = line_offsets(text);
        let locations = vec![
            location(LocationKind::Token, (2, 6, 2, 6)),
            location(LocationKind::Scope, (2, 1, 2, 10)),
        ];
        let record = chunk_for_symbol(&graph, &symbol, &locations, text, &offsets).unwrap();
        assert_eq!(record.code_chunk, "void y(){}");
        assert_eq!(record.name, "y");
        assert_eq!(record.kind, "Function");
        assert_eq!(record.references.len(), 1);
        assert_eq!(record.references[0].kind, "Call");
        assert_eq!(record.references[0].target_id, 7);
        assert_eq!(record.content_hash.len(), 64);
    }

    #[test]
    fn test_chunk_for_symbol_falls_back_to_token() {
        let (graph, symbol) = graph_with_symbol();
        let text = b"int x;\nvoid y(){}\n";
        let offsets = line_offsets(text);
        let locations = vec![location(LocationKind::Token, (2, 6, 2, 6))];
        let record = chunk_for_symbol(&graph, &symbol, &locations, text, &offsets).unwrap();
        assert_eq!(record.code_chunk, "y");
    }

    #[test]
    fn test_chunk_for_symbol_skips_without_scope_or_token() {
        let (graph, symbol) = graph_with_symbol();
        let text = b"int x;\n";
        let offsets = line_offsets(text);
        let locations = vec![location(LocationKind::Signature, (1, 1, 1, 3))];
        assert!(chunk_for_symbol(&graph, &symbol, &locations, text, &offsets).is_none());
        assert!(chunk_for_symbol(&graph, &symbol, &[], text, &offsets).is_none());
    }

    #[test]
    fn test_chunk_records_signature_fqn() {
        let symbol = Node {
            id: 3,
            node_kind: SymbolKind::Method.to_node_kind(),
            serialized_name: "::\tmFoo\ts\tp\tnbar\tsvoid\tp(int)".to_string(),
        };
        let graph = SymbolGraph::build(std::slice::from_ref(&symbol), &[]).unwrap();
        let text = b"void bar(int){}\n";
        let offsets = line_offsets(text);
        let locations = vec![location(LocationKind::Scope, (1, 1, 1, 15))];
        let record = chunk_for_symbol(&graph, &symbol, &locations, text, &offsets).unwrap();
        assert_eq!(record.fully_qualified_name, "void Foo::bar(int)");
        assert_eq!(record.name, "bar");
    }
}
