//! Configuration for the three tools.
//!
//! The impact analyzer reads an INI-like file with three sections:
//!
//! ```text
//! [test_namespace]
//! UnitTests
//!
//! [start_symbols]
//! kind=METHOD, MyNS::Foo::bar
//! kind=*, Helper
//! OtherSymbol
//!
//! [exclude_symbols]
//! FooTests
//! MyNS::Legacy
//! ```
//!
//! `#` and `;` introduce line comments. The chunker reads a JSON config.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;
use crate::graph::StartSpec;
use crate::kinds::parse_symbol_kind;

/// Parsed impact-analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactConfig {
    pub test_namespace: String,
    pub start_symbols: Vec<StartSpec>,
    pub exclude_symbols: HashSet<String>,
}

impl ImpactConfig {
    /// Load and parse the INI-like config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ImpactConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Unreadable(path.display().to_string(), e.to_string())
        })?;
        ImpactConfig::parse(&text)
    }

    /// Parse config text.
    pub fn parse(text: &str) -> Result<ImpactConfig, ConfigError> {
        #[derive(PartialEq, Clone, Copy)]
        enum Section {
            None,
            TestNamespace,
            StartSymbols,
            ExcludeSymbols,
        }

        let mut section = Section::None;
        let mut namespaces: Vec<String> = Vec::new();
        let mut start_symbols: Vec<StartSpec> = Vec::new();
        let mut exclude_symbols: HashSet<String> = HashSet::new();
        let mut saw_start_section = false;

        for raw_line in text.lines() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = match name {
                    "test_namespace" => Section::TestNamespace,
                    "start_symbols" => {
                        saw_start_section = true;
                        Section::StartSymbols
                    }
                    "exclude_symbols" => Section::ExcludeSymbols,
                    _ => return Err(ConfigError::MalformedLine(raw_line.trim().to_string())),
                };
                continue;
            }
            match section {
                Section::None => {
                    return Err(ConfigError::MalformedLine(raw_line.trim().to_string()));
                }
                Section::TestNamespace => namespaces.push(line.to_string()),
                Section::StartSymbols => start_symbols.push(parse_start_line(line)?),
                Section::ExcludeSymbols => {
                    exclude_symbols.insert(line.to_string());
                }
            }
        }

        if namespaces.is_empty() {
            return Err(ConfigError::MissingSection("test_namespace"));
        }
        if namespaces.len() != 1 {
            return Err(ConfigError::BadNamespaceCount(namespaces.len()));
        }
        if !saw_start_section || start_symbols.is_empty() {
            return Err(ConfigError::MissingSection("start_symbols"));
        }

        Ok(ImpactConfig {
            test_namespace: namespaces.remove(0),
            start_symbols,
            exclude_symbols,
        })
    }
}

/// Cut a line at the first `#` or `;`.
fn strip_comment(line: &str) -> &str {
    match line.find(['#', ';']) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse one `[start_symbols]` line: `kind=<KIND|*>, <pattern>` with the
/// kind prefix optional.
fn parse_start_line(line: &str) -> Result<StartSpec, ConfigError> {
    if let Some(rest) = line.strip_prefix("kind=") {
        let Some((kind_name, pattern)) = rest.split_once(',') else {
            return Err(ConfigError::MalformedLine(line.to_string()));
        };
        let kind_name = kind_name.trim();
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ConfigError::MalformedLine(line.to_string()));
        }
        let kind = if kind_name == "*" {
            None
        } else {
            Some(
                parse_symbol_kind(kind_name)
                    .ok_or_else(|| ConfigError::UnknownKind(kind_name.to_string(), line.to_string()))?,
            )
        };
        return Ok(StartSpec {
            kind,
            pattern: pattern.to_string(),
        });
    }
    Ok(StartSpec {
        kind: None,
        pattern: line.to_string(),
    })
}

/// Chunker configuration, read from JSON.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub db_path: String,
    pub project_name: String,
    #[serde(default)]
    pub project_description: Option<String>,
    /// Local project root.
    pub root_dir: String,
    /// Root path used when the database was indexed.
    pub indexed_root: String,
    pub chunk_output_root: String,
    #[serde(default)]
    pub paths_to_chunk: Vec<String>,
}

impl ChunkerConfig {
    /// Load and parse the JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ChunkerConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Unreadable(path.display().to_string(), e.to_string())
        })?;
        serde_json::from_str(&text)
            .map_err(|e| ConfigError::MalformedLine(format!("{}: {}", path.display(), e)))
    }
}
