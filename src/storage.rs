//! Read-only access to the index database, plus the companion mapping store.
//!
//! [`IndexStorage`] wraps one SQLite connection to a code-index file and
//! exposes the row streams and targeted lookups the graph layer consumes.
//! Full streams (`all_nodes`, `all_edges_brief`) exist for bulk graph
//! construction; the targeted lookups avoid streaming the whole graph for
//! small operations, and `all_edges_brief` skips strings entirely so
//! adjacency construction does not pay for names it never reads.
//!
//! Nothing in this module mutates the index database. The only write path is
//! [`MappingStore`], which appends `(symbol_id, test_symbol_id)` pairs to the
//! `tests` table of a separate companion database.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::StorageError;
use crate::kinds::{DefinitionKind, EdgeKind, LocationKind, SymbolKind};

/// Storage version this reader understands.
pub const SUPPORTED_STORAGE_VERSION: i64 = 25;

/// One row of the node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: i64,
    pub node_kind: i64,
    pub serialized_name: String,
}

impl Node {
    /// Node kind decoded to the closed symbol-kind enumeration.
    pub fn symbol_kind(&self) -> SymbolKind {
        SymbolKind::from_node_kind(self.node_kind)
    }
}

/// Compact edge view for adjacency construction: endpoints and kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeBrief {
    pub source_id: i64,
    pub target_id: i64,
    pub kind: EdgeKind,
}

/// One row of the file table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub id: i64,
    pub path: String,
    pub language: String,
    pub indexed: bool,
    pub complete: bool,
}

/// One row of the source_location table. Lines and columns are 1-based; the
/// end column is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub id: i64,
    pub file_id: i64,
    pub start_line: i64,
    pub start_col: i64,
    pub end_line: i64,
    pub end_col: i64,
    pub kind: LocationKind,
}

/// Row counts reported at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub nodes: usize,
    pub symbols: usize,
    pub edges: usize,
    pub files: usize,
    pub version: i64,
}

/// Read-only handle on an index database.
pub struct IndexStorage {
    conn: Connection,
    version: i64,
}

impl IndexStorage {
    /// Open an index database for reading and validate its schema version.
    ///
    /// # Arguments
    /// * `db_path` - Path to the index database file
    ///
    /// # Returns
    /// A handle, or `StorageError::IncompatibleVersion` when the stored
    /// version differs from [`SUPPORTED_STORAGE_VERSION`].
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<IndexStorage, StorageError> {
        let path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StorageError::Open(path.display().to_string(), e.to_string()))?;

        let version = read_storage_version(&conn)?;
        if version != SUPPORTED_STORAGE_VERSION {
            return Err(StorageError::IncompatibleVersion {
                found: version,
                supported: SUPPORTED_STORAGE_VERSION,
            });
        }

        Ok(IndexStorage { conn, version })
    }

    /// Stored schema version of the open database.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Row counts for the startup summary.
    pub fn stats(&self) -> Result<IndexStats, StorageError> {
        let count = |sql: &str| -> Result<usize, StorageError> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(IndexStats {
            nodes: count("SELECT COUNT(*) FROM node")?,
            symbols: count("SELECT COUNT(*) FROM symbol")?,
            edges: count("SELECT COUNT(*) FROM edge")?,
            files: count("SELECT COUNT(*) FROM file")?,
            version: self.version,
        })
    }

    /// All files recorded in the index.
    pub fn all_files(&self) -> Result<Vec<FileRow>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, path, language, indexed, complete FROM file")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FileRow {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    language: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    indexed: row.get::<_, i64>(3)? != 0,
                    complete: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All nodes, symbols and non-symbols alike.
    pub fn all_nodes(&self) -> Result<Vec<Node>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, type, serialized_name FROM node")?;
        let rows = stmt
            .query_map([], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Nodes that appear in the symbol table (inner join).
    pub fn all_symbol_nodes(&self) -> Result<Vec<Node>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT node.id, node.type, node.serialized_name
             FROM node INNER JOIN symbol ON symbol.id = node.id",
        )?;
        let rows = stmt
            .query_map([], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All edges as compact endpoint/kind triples, in table order.
    pub fn all_edges_brief(&self) -> Result<Vec<EdgeBrief>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT source_node_id, target_node_id, type FROM edge ORDER BY id")?;
        let rows = stmt
            .query_map([], edge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Look up one node by id.
    pub fn node_by_id(&self, id: i64) -> Result<Option<Node>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, type, serialized_name FROM node WHERE id = ?1")?;
        Ok(stmt.query_row(params![id], node_from_row).optional()?)
    }

    /// Definition kind of a symbol, or None when the id denotes no symbol.
    pub fn definition_kind_of(&self, id: i64) -> Result<Option<DefinitionKind>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT definition_kind FROM symbol WHERE id = ?1")?;
        let value: Option<i64> = stmt
            .query_row(params![id], |row| row.get(0))
            .optional()?;
        Ok(value.and_then(DefinitionKind::from_db))
    }

    /// Nodes whose serialized name equals the given key exactly.
    ///
    /// Combined with [`crate::name::encode_qualified`] this is the fast path
    /// for exact qualified-name lookup.
    pub fn nodes_by_serialized_exact(&self, serialized: &str) -> Result<Vec<Node>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, type, serialized_name FROM node WHERE serialized_name = ?1",
        )?;
        let rows = stmt
            .query_map(params![serialized], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Symbol nodes whose serialized name matches a SQL LIKE pattern.
    pub fn symbol_nodes_by_serialized_like(
        &self,
        pattern: &str,
    ) -> Result<Vec<Node>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT node.id, node.type, node.serialized_name
             FROM node INNER JOIN symbol ON symbol.id = node.id
             WHERE node.serialized_name LIKE ?1",
        )?;
        let rows = stmt
            .query_map(params![pattern], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Edges whose source is the given node.
    pub fn edges_from(&self, id: i64) -> Result<Vec<EdgeBrief>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT source_node_id, target_node_id, type FROM edge
             WHERE source_node_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![id], edge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Edges whose target is the given node.
    pub fn edges_to(&self, id: i64) -> Result<Vec<EdgeBrief>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT source_node_id, target_node_id, type FROM edge
             WHERE target_node_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![id], edge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Edges from a node, restricted to the given kinds.
    pub fn edges_from_of_kinds(
        &self,
        id: i64,
        kinds: &[EdgeKind],
    ) -> Result<Vec<EdgeBrief>, StorageError> {
        if kinds.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; kinds.len()].join(", ");
        let sql = format!(
            "SELECT source_node_id, target_node_id, type FROM edge
             WHERE source_node_id = ? AND type IN ({placeholders}) ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values: Vec<i64> = vec![id];
        values.extend(kinds.iter().map(|k| k.to_db()));
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values), edge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Symbols with at least one source location in any of the given files.
    pub fn symbols_in_files(&self, file_ids: &[i64]) -> Result<Vec<Node>, StorageError> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; file_ids.len()].join(", ");
        let sql = format!(
            "SELECT DISTINCT node.id, node.type, node.serialized_name
             FROM node
             INNER JOIN symbol ON symbol.id = node.id
             INNER JOIN occurrence ON occurrence.element_id = node.id
             INNER JOIN source_location ON source_location.id = occurrence.source_location_id
             WHERE source_location.file_node_id IN ({placeholders})
             ORDER BY node.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(file_ids.iter()), node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All source locations recorded in one file.
    pub fn locations_in_file(&self, file_id: i64) -> Result<Vec<SourceLocation>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, file_node_id, start_line, start_column, end_line, end_column, type
             FROM source_location WHERE file_node_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![file_id], location_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All source locations of a symbol, across files.
    pub fn locations_for_symbol(&self, id: i64) -> Result<Vec<SourceLocation>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT sl.id, sl.file_node_id, sl.start_line, sl.start_column,
                    sl.end_line, sl.end_column, sl.type
             FROM source_location sl
             INNER JOIN occurrence ON occurrence.source_location_id = sl.id
             WHERE occurrence.element_id = ?1 ORDER BY sl.id",
        )?;
        let rows = stmt
            .query_map(params![id], location_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Source locations of a symbol restricted to one file.
    pub fn locations_for_symbol_in_file(
        &self,
        id: i64,
        file_id: i64,
    ) -> Result<Vec<SourceLocation>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT sl.id, sl.file_node_id, sl.start_line, sl.start_column,
                    sl.end_line, sl.end_column, sl.type
             FROM source_location sl
             INNER JOIN occurrence ON occurrence.source_location_id = sl.id
             WHERE occurrence.element_id = ?1 AND sl.file_node_id = ?2
             ORDER BY sl.id",
        )?;
        let rows = stmt
            .query_map(params![id, file_id], location_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn read_storage_version(conn: &Connection) -> Result<i64, StorageError> {
    let mut stmt = conn
        .prepare("SELECT value FROM meta WHERE key = 'storage_version'")
        .map_err(|_| StorageError::MissingSchema("meta table"))?;
    let value: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
    let value = value.ok_or(StorageError::MissingSchema("storage_version meta entry"))?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| StorageError::MissingSchema("numeric storage_version meta entry"))
}

fn node_from_row(row: &rusqlite::Row) -> rusqlite::Result<Node> {
    Ok(Node {
        id: row.get(0)?,
        node_kind: row.get(1)?,
        serialized_name: row.get(2)?,
    })
}

fn edge_from_row(row: &rusqlite::Row) -> rusqlite::Result<EdgeBrief> {
    Ok(EdgeBrief {
        source_id: row.get(0)?,
        target_id: row.get(1)?,
        kind: EdgeKind::from_db(row.get(2)?),
    })
}

fn location_from_row(row: &rusqlite::Row) -> rusqlite::Result<SourceLocation> {
    Ok(SourceLocation {
        id: row.get(0)?,
        file_id: row.get(1)?,
        start_line: row.get(2)?,
        start_col: row.get(3)?,
        end_line: row.get(4)?,
        end_col: row.get(5)?,
        kind: LocationKind::from_db(row.get(6)?),
    })
}

/// Append-only store for `(symbol_id, test_symbol_id)` pairs.
///
/// Holds the target database path and opens a connection per operation.
pub struct MappingStore {
    db_path: std::path::PathBuf,
}

impl MappingStore {
    /// Create a new MappingStore with the given database path.
    pub fn new<P: AsRef<Path>>(db_path: P) -> MappingStore {
        MappingStore {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Get a connection to the database.
    fn connect(&self) -> Result<Connection, StorageError> {
        Connection::open(&self.db_path)
            .map_err(|e| StorageError::Open(self.db_path.display().to_string(), e.to_string()))
    }

    /// Ensure the tests table exists.
    pub fn ensure_schema(&self) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tests (
                symbol_id INTEGER NOT NULL,
                test_symbol_id INTEGER NOT NULL,
                UNIQUE(symbol_id, test_symbol_id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tests_symbol ON tests(symbol_id)",
            [],
        )?;
        Ok(())
    }

    /// Insert every pair inside one transaction.
    ///
    /// Pairs already present are ignored by the unique constraint; a failed
    /// insert is reported on stderr and does not abort the transaction.
    ///
    /// # Returns
    /// The number of rows actually inserted.
    pub fn record_mappings(&self, pairs: &BTreeSet<(i64, i64)>) -> Result<usize, StorageError> {
        let conn = self.connect()?;
        let tx = conn.unchecked_transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO tests (symbol_id, test_symbol_id) VALUES (?1, ?2)",
            )?;
            for &(symbol_id, test_symbol_id) in pairs {
                match stmt.execute(params![symbol_id, test_symbol_id]) {
                    Ok(changed) => inserted += changed,
                    Err(e) => {
                        eprintln!(
                            "[testindex] failed to record mapping ({}, {}): {}",
                            symbol_id, test_symbol_id, e
                        );
                    }
                }
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Count rows currently stored in the tests table.
    pub fn count_mappings(&self) -> Result<usize, StorageError> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM tests", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
