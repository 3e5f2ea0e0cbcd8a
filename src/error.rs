//! Error types for the component boundaries.
//!
//! Failures are values carrying a kind and a message; commands wrap them in
//! `anyhow::Result` and turn them into a non-zero exit code. Per-node data
//! shape issues during traversal are not errors: traversals skip the node and
//! warn on the diagnostic stream.

/// Errors raised while loading or validating tool configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file cannot be read
    #[error("cannot read config file {0}: {1}")]
    Unreadable(String, String),

    /// A required section is missing
    #[error("config is missing required section [{0}]")]
    MissingSection(&'static str),

    /// The test namespace section must hold exactly one non-blank line
    #[error("section [test_namespace] must contain exactly one name, found {0}")]
    BadNamespaceCount(usize),

    /// A `kind=` prefix names no known symbol kind
    #[error("unknown symbol kind '{0}' in start symbol line '{1}'")]
    UnknownKind(String, String),

    /// A line does not fit the section's format
    #[error("malformed config line '{0}'")]
    MalformedLine(String),
}

/// Errors raised by the storage adapter.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database file cannot be opened
    #[error("cannot open index database {0}: {1}")]
    Open(String, String),

    /// Stored schema version differs from the supported one
    #[error("database version {found} is not supported (expected {supported})")]
    IncompatibleVersion { found: i64, supported: i64 },

    /// A required table or meta entry is absent
    #[error("index database is missing {0}")]
    MissingSchema(&'static str),

    /// Driver failure on a query
    #[error("storage query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Errors raised while resolving names against the graph.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// A start spec matched zero symbols
    #[error("no symbols found for start pattern '{0}'")]
    StartNotFound(String),

    /// The test namespace matched zero nodes
    #[error("test namespace not found: {0}")]
    NamespaceNotFound(String),
}
