//! Trailmap: analytical workflows over Sourcetrail-style code-index databases
//!
//! Trailmap opens a pre-populated code-index database (symbols, the directed
//! relations between them, and their source locations), decodes it into a
//! compact in-memory graph, and runs three traversal workflows over it:
//!
//! - **Test-impact analysis** (`impact-analyzer`): reverse reachability from
//!   start symbols to the test classes of a namespace.
//! - **Test-mapping indexing** (`test-indexer`): forward reachability from
//!   every test method, persisted as `(symbol, test_method)` pairs into a
//!   companion database.
//! - **Code chunking** (`chunker`): per-file JSON records of located symbols
//!   with their source slices and outgoing relations.
//!
//! # Position Conventions
//!
//! The index records source ranges with 1-indexed lines and columns, and the
//! end column is **inclusive**. An end column of zero means "through the end
//! of the end line". See [`graph::slice_range`].
//!
//! # Lifecycle
//!
//! The database handle is only used during the single-threaded build-up
//! phase. Once [`graph::SymbolGraph`] is built the handle is dropped; all
//! traversal reads are lock-free over the immutable graph.

pub mod config;
pub mod error;
pub mod graph;
pub mod kinds;
pub mod name;
pub mod storage;
pub mod traverse;

pub mod chunk_cmd;
pub mod impact_cmd;
pub mod index_cmd;

pub use config::{ChunkerConfig, ImpactConfig};
pub use error::{ConfigError, ResolutionError, StorageError};
pub use graph::{
    run_impact_analysis, ChunkRecord, FileChunks, ImpactOptions, ImpactResult, MappingRun,
    StartMode, StartSpec, SymbolGraph, TestHit,
};
pub use kinds::{
    format_edge_kind, format_symbol_kind, parse_symbol_kind, DefinitionKind, EdgeKind,
    LocationKind, SymbolKind,
};
pub use name::{encode_qualified, NameElement, NameHierarchy};
pub use storage::{
    EdgeBrief, FileRow, IndexStats, IndexStorage, MappingStore, Node, SourceLocation,
    SUPPORTED_STORAGE_VERSION,
};
pub use traverse::{worker_count, PathQueue, SharedSet, WorkCursor, NO_PARENT};
