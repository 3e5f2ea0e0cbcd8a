//! Kind enumerations for nodes, edges, definitions and source locations.
//!
//! The index database stores kinds as bitmask-style integers. The mappings
//! here are stable within one storage version; unknown values decode to the
//! `Unknown` variants instead of failing, because an index produced by a
//! newer tool may carry kinds this reader does not know about.

/// Classification of a symbol node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Type,
    BuiltinType,
    Module,
    Namespace,
    Package,
    Struct,
    Class,
    Interface,
    Annotation,
    GlobalVariable,
    Field,
    Function,
    Method,
    Enum,
    EnumConstant,
    Typedef,
    TypeParameter,
    File,
    Macro,
    Union,
    Unknown,
}

impl SymbolKind {
    /// Decode the stored node kind bitmask.
    pub fn from_node_kind(value: i64) -> SymbolKind {
        match value {
            v if v == 1 << 1 => SymbolKind::Type,
            v if v == 1 << 2 => SymbolKind::BuiltinType,
            v if v == 1 << 3 => SymbolKind::Module,
            v if v == 1 << 4 => SymbolKind::Namespace,
            v if v == 1 << 5 => SymbolKind::Package,
            v if v == 1 << 6 => SymbolKind::Struct,
            v if v == 1 << 7 => SymbolKind::Class,
            v if v == 1 << 8 => SymbolKind::Interface,
            v if v == 1 << 9 => SymbolKind::Annotation,
            v if v == 1 << 10 => SymbolKind::GlobalVariable,
            v if v == 1 << 11 => SymbolKind::Field,
            v if v == 1 << 12 => SymbolKind::Function,
            v if v == 1 << 13 => SymbolKind::Method,
            v if v == 1 << 14 => SymbolKind::Enum,
            v if v == 1 << 15 => SymbolKind::EnumConstant,
            v if v == 1 << 16 => SymbolKind::Typedef,
            v if v == 1 << 17 => SymbolKind::TypeParameter,
            v if v == 1 << 18 => SymbolKind::File,
            v if v == 1 << 19 => SymbolKind::Macro,
            v if v == 1 << 20 => SymbolKind::Union,
            _ => SymbolKind::Unknown,
        }
    }

    /// Encode back to the stored node kind bitmask.
    pub fn to_node_kind(self) -> i64 {
        match self {
            SymbolKind::Type => 1 << 1,
            SymbolKind::BuiltinType => 1 << 2,
            SymbolKind::Module => 1 << 3,
            SymbolKind::Namespace => 1 << 4,
            SymbolKind::Package => 1 << 5,
            SymbolKind::Struct => 1 << 6,
            SymbolKind::Class => 1 << 7,
            SymbolKind::Interface => 1 << 8,
            SymbolKind::Annotation => 1 << 9,
            SymbolKind::GlobalVariable => 1 << 10,
            SymbolKind::Field => 1 << 11,
            SymbolKind::Function => 1 << 12,
            SymbolKind::Method => 1 << 13,
            SymbolKind::Enum => 1 << 14,
            SymbolKind::EnumConstant => 1 << 15,
            SymbolKind::Typedef => 1 << 16,
            SymbolKind::TypeParameter => 1 << 17,
            SymbolKind::File => 1 << 18,
            SymbolKind::Macro => 1 << 19,
            SymbolKind::Union => 1 << 20,
            SymbolKind::Unknown => 1 << 0,
        }
    }
}

/// Format a SymbolKind for display
///
/// # Arguments
/// * `kind` - The SymbolKind to format
///
/// # Returns
/// Human-readable string representation of the symbol kind
pub fn format_symbol_kind(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Type => "Type",
        SymbolKind::BuiltinType => "Builtin Type",
        SymbolKind::Module => "Module",
        SymbolKind::Namespace => "Namespace",
        SymbolKind::Package => "Package",
        SymbolKind::Struct => "Struct",
        SymbolKind::Class => "Class",
        SymbolKind::Interface => "Interface",
        SymbolKind::Annotation => "Annotation",
        SymbolKind::GlobalVariable => "Global Variable",
        SymbolKind::Field => "Field",
        SymbolKind::Function => "Function",
        SymbolKind::Method => "Method",
        SymbolKind::Enum => "Enum",
        SymbolKind::EnumConstant => "Enum Constant",
        SymbolKind::Typedef => "Typedef",
        SymbolKind::TypeParameter => "Type Parameter",
        SymbolKind::File => "File",
        SymbolKind::Macro => "Macro",
        SymbolKind::Union => "Union",
        SymbolKind::Unknown => "Unknown",
    }
}

/// Parse a string into a SymbolKind (case-insensitive)
///
/// Used by the impact-analyzer config parser for `kind=` prefixes.
///
/// # Arguments
/// * `s` - String to parse
///
/// # Returns
/// Some(SymbolKind) if recognized, None otherwise
pub fn parse_symbol_kind(s: &str) -> Option<SymbolKind> {
    match s.to_lowercase().as_str() {
        "type" => Some(SymbolKind::Type),
        "builtin_type" => Some(SymbolKind::BuiltinType),
        "module" => Some(SymbolKind::Module),
        "namespace" | "ns" => Some(SymbolKind::Namespace),
        "package" => Some(SymbolKind::Package),
        "struct" => Some(SymbolKind::Struct),
        "class" => Some(SymbolKind::Class),
        "interface" => Some(SymbolKind::Interface),
        "annotation" => Some(SymbolKind::Annotation),
        "global_variable" | "global" => Some(SymbolKind::GlobalVariable),
        "field" => Some(SymbolKind::Field),
        "function" | "fn" => Some(SymbolKind::Function),
        "method" => Some(SymbolKind::Method),
        "enum" => Some(SymbolKind::Enum),
        "enum_constant" => Some(SymbolKind::EnumConstant),
        "typedef" => Some(SymbolKind::Typedef),
        "type_parameter" => Some(SymbolKind::TypeParameter),
        "macro" => Some(SymbolKind::Macro),
        "union" => Some(SymbolKind::Union),
        _ => None,
    }
}

/// Directed relation between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Member,
    TypeUsage,
    Usage,
    Call,
    Inheritance,
    Override,
    TypeArgument,
    TemplateSpecialization,
    Include,
    Import,
    MacroUsage,
    AnnotationUsage,
    Unknown,
}

impl EdgeKind {
    /// Decode the stored edge kind bitmask.
    pub fn from_db(value: i64) -> EdgeKind {
        match value {
            v if v == 1 << 0 => EdgeKind::Member,
            v if v == 1 << 1 => EdgeKind::TypeUsage,
            v if v == 1 << 2 => EdgeKind::Usage,
            v if v == 1 << 3 => EdgeKind::Call,
            v if v == 1 << 4 => EdgeKind::Inheritance,
            v if v == 1 << 5 => EdgeKind::Override,
            v if v == 1 << 6 => EdgeKind::TypeArgument,
            v if v == 1 << 7 => EdgeKind::TemplateSpecialization,
            v if v == 1 << 8 => EdgeKind::Include,
            v if v == 1 << 9 => EdgeKind::Import,
            v if v == 1 << 10 => EdgeKind::MacroUsage,
            v if v == 1 << 11 => EdgeKind::AnnotationUsage,
            _ => EdgeKind::Unknown,
        }
    }

    /// Encode back to the stored edge kind bitmask.
    pub fn to_db(self) -> i64 {
        match self {
            EdgeKind::Member => 1 << 0,
            EdgeKind::TypeUsage => 1 << 1,
            EdgeKind::Usage => 1 << 2,
            EdgeKind::Call => 1 << 3,
            EdgeKind::Inheritance => 1 << 4,
            EdgeKind::Override => 1 << 5,
            EdgeKind::TypeArgument => 1 << 6,
            EdgeKind::TemplateSpecialization => 1 << 7,
            EdgeKind::Include => 1 << 8,
            EdgeKind::Import => 1 << 9,
            EdgeKind::MacroUsage => 1 << 10,
            EdgeKind::AnnotationUsage => 1 << 11,
            EdgeKind::Unknown => 0,
        }
    }
}

/// Format an EdgeKind for display
pub fn format_edge_kind(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Member => "Member",
        EdgeKind::TypeUsage => "Type Usage",
        EdgeKind::Usage => "Usage",
        EdgeKind::Call => "Call",
        EdgeKind::Inheritance => "Inheritance",
        EdgeKind::Override => "Override",
        EdgeKind::TypeArgument => "Type Argument",
        EdgeKind::TemplateSpecialization => "Template Specialization",
        EdgeKind::Include => "Include",
        EdgeKind::Import => "Import",
        EdgeKind::MacroUsage => "Macro Usage",
        EdgeKind::AnnotationUsage => "Annotation Usage",
        EdgeKind::Unknown => "Unknown",
    }
}

/// How a symbol was defined in the indexed sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Implicit,
    Explicit,
    Ambiguous,
}

impl DefinitionKind {
    pub fn from_db(value: i64) -> Option<DefinitionKind> {
        match value {
            1 => Some(DefinitionKind::Implicit),
            2 => Some(DefinitionKind::Explicit),
            3 => Some(DefinitionKind::Ambiguous),
            _ => None,
        }
    }

    pub fn to_db(self) -> i64 {
        match self {
            DefinitionKind::Implicit => 1,
            DefinitionKind::Explicit => 2,
            DefinitionKind::Ambiguous => 3,
        }
    }
}

/// What a source location marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    Token,
    Scope,
    Qualifier,
    LocalSymbol,
    Signature,
    Comment,
    Error,
    FulltextSearch,
    ScreenSearch,
    Unsolved,
    Unknown,
}

impl LocationKind {
    pub fn from_db(value: i64) -> LocationKind {
        match value {
            0 => LocationKind::Token,
            1 => LocationKind::Scope,
            2 => LocationKind::Qualifier,
            3 => LocationKind::LocalSymbol,
            4 => LocationKind::Signature,
            5 => LocationKind::Comment,
            6 => LocationKind::Error,
            7 => LocationKind::FulltextSearch,
            8 => LocationKind::ScreenSearch,
            9 => LocationKind::Unsolved,
            _ => LocationKind::Unknown,
        }
    }

    pub fn to_db(self) -> i64 {
        match self {
            LocationKind::Token => 0,
            LocationKind::Scope => 1,
            LocationKind::Qualifier => 2,
            LocationKind::LocalSymbol => 3,
            LocationKind::Signature => 4,
            LocationKind::Comment => 5,
            LocationKind::Error => 6,
            LocationKind::FulltextSearch => 7,
            LocationKind::ScreenSearch => 8,
            LocationKind::Unsolved => 9,
            LocationKind::Unknown => -1,
        }
    }
}
