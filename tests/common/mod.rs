//! Shared fixture builder: seeds real index databases on disk.
#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::path::Path;

use trailmap::{encode_qualified, DefinitionKind, EdgeKind, LocationKind, SymbolKind};

/// Builder over a freshly created index database file.
pub struct IndexFixture {
    conn: Connection,
    next_id: i64,
}

impl IndexFixture {
    /// Create an index database with the supported storage version.
    pub fn create<P: AsRef<Path>>(path: P) -> IndexFixture {
        IndexFixture::create_with_version(path, trailmap::SUPPORTED_STORAGE_VERSION)
    }

    /// Create an index database claiming an arbitrary storage version.
    pub fn create_with_version<P: AsRef<Path>>(path: P, version: i64) -> IndexFixture {
        let conn = Connection::open(path).expect("create fixture db");
        conn.execute_batch(
            "CREATE TABLE meta(id INTEGER PRIMARY KEY, key TEXT, value TEXT);
             CREATE TABLE node(id INTEGER PRIMARY KEY, type INTEGER, serialized_name TEXT);
             CREATE TABLE symbol(id INTEGER PRIMARY KEY, definition_kind INTEGER);
             CREATE TABLE edge(id INTEGER PRIMARY KEY, type INTEGER,
                               source_node_id INTEGER, target_node_id INTEGER);
             CREATE TABLE file(id INTEGER PRIMARY KEY, path TEXT, language TEXT,
                               modification_time TEXT, indexed INTEGER, complete INTEGER,
                               line_count INTEGER);
             CREATE TABLE source_location(id INTEGER PRIMARY KEY, file_node_id INTEGER,
                                          start_line INTEGER, start_column INTEGER,
                                          end_line INTEGER, end_column INTEGER, type INTEGER);
             CREATE TABLE occurrence(element_id INTEGER, source_location_id INTEGER);",
        )
        .expect("create fixture schema");
        conn.execute(
            "INSERT INTO meta(key, value) VALUES('storage_version', ?1)",
            params![version.to_string()],
        )
        .expect("seed storage_version");
        IndexFixture { conn, next_id: 0 }
    }

    fn fresh_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Insert a raw node row without a symbol entry.
    pub fn add_node(&mut self, kind: SymbolKind, serialized_name: &str) -> i64 {
        let id = self.fresh_id();
        self.conn
            .execute(
                "INSERT INTO node(id, type, serialized_name) VALUES(?1, ?2, ?3)",
                params![id, kind.to_node_kind(), serialized_name],
            )
            .expect("insert node");
        id
    }

    /// Insert a node plus its symbol-table entry, named by `::`-joined
    /// elements with empty prefixes/postfixes.
    pub fn add_symbol(&mut self, kind: SymbolKind, names: &[&str]) -> i64 {
        self.add_symbol_serialized(kind, &encode_qualified(names, "::"))
    }

    /// Insert a symbol with an explicit serialized name.
    pub fn add_symbol_serialized(&mut self, kind: SymbolKind, serialized_name: &str) -> i64 {
        let id = self.add_node(kind, serialized_name);
        self.conn
            .execute(
                "INSERT INTO symbol(id, definition_kind) VALUES(?1, ?2)",
                params![id, DefinitionKind::Explicit.to_db()],
            )
            .expect("insert symbol");
        id
    }

    pub fn add_edge(&mut self, source_id: i64, target_id: i64, kind: EdgeKind) -> i64 {
        let id = self.fresh_id();
        self.conn
            .execute(
                "INSERT INTO edge(id, type, source_node_id, target_node_id)
                 VALUES(?1, ?2, ?3, ?4)",
                params![id, kind.to_db(), source_id, target_id],
            )
            .expect("insert edge");
        id
    }

    /// Insert a file row plus its node row, as the indexer records them.
    pub fn add_file(&mut self, path: &str, language: &str) -> i64 {
        let id = self.fresh_id();
        self.conn
            .execute(
                "INSERT INTO node(id, type, serialized_name) VALUES(?1, ?2, ?3)",
                params![id, SymbolKind::File.to_node_kind(), encode_qualified(&[path], "/")],
            )
            .expect("insert file node");
        self.conn
            .execute(
                "INSERT INTO file(id, path, language, modification_time, indexed, complete, line_count)
                 VALUES(?1, ?2, ?3, '', 1, 1, 0)",
                params![id, path, language],
            )
            .expect("insert file");
        id
    }

    /// Insert a source location and return its id.
    pub fn add_location(
        &mut self,
        file_id: i64,
        kind: LocationKind,
        range: (i64, i64, i64, i64),
    ) -> i64 {
        let id = self.fresh_id();
        self.conn
            .execute(
                "INSERT INTO source_location(id, file_node_id, start_line, start_column,
                                             end_line, end_column, type)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, file_id, range.0, range.1, range.2, range.3, kind.to_db()],
            )
            .expect("insert source_location");
        id
    }

    pub fn add_occurrence(&mut self, element_id: i64, source_location_id: i64) {
        self.conn
            .execute(
                "INSERT INTO occurrence(element_id, source_location_id) VALUES(?1, ?2)",
                params![element_id, source_location_id],
            )
            .expect("insert occurrence");
    }

    /// Record a symbol's location in a file: source_location + occurrence.
    pub fn locate(
        &mut self,
        symbol_id: i64,
        file_id: i64,
        kind: LocationKind,
        range: (i64, i64, i64, i64),
    ) -> i64 {
        let location_id = self.add_location(file_id, kind, range);
        self.add_occurrence(symbol_id, location_id);
        location_id
    }

    /// Close the builder, flushing everything to disk.
    pub fn finish(self) {
        drop(self.conn);
    }
}
