//! Codec for the serialized name hierarchy format.
//!
//! The index stores every node name as a single string:
//!
//! ```text
//! <delimiter>\tm<name>\ts<prefix>\tp<postfix>[\tn<name>\ts<prefix>\tp<postfix>]...
//! ```
//!
//! The delimiter (usually `::` or `.`) comes first, terminated by the meta
//! marker `\tm`. Elements follow, separated by `\tn`; inside each element the
//! name, prefix and postfix are separated by `\ts` and `\tp`. For functions
//! and methods the tail element's prefix carries the return type and the
//! postfix carries the parameter list.
//!
//! Decoding never fails: malformed input degrades to a partial parse, or to a
//! single element holding the raw string.

/// Marker between the delimiter and the first element.
const META: &str = "\tm";
/// Separator between elements.
const NAME: &str = "\tn";
/// Separator between an element's name and its prefix.
const PART: &str = "\ts";
/// Separator between an element's prefix and its postfix.
const SIG: &str = "\tp";

/// Delimiter assumed when the input carries no meta marker.
pub const DEFAULT_DELIMITER: &str = "::";

/// One component of a hierarchical name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameElement {
    pub name: String,
    pub prefix: String,
    pub postfix: String,
}

impl NameElement {
    /// Element with a name and empty prefix/postfix.
    pub fn plain(name: &str) -> NameElement {
        NameElement {
            name: name.to_string(),
            prefix: String::new(),
            postfix: String::new(),
        }
    }
}

/// Decoded form of a serialized name: a delimiter plus ordered elements.
///
/// The element list is never empty for a decoded hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameHierarchy {
    pub delimiter: String,
    pub elements: Vec<NameElement>,
}

impl NameHierarchy {
    /// Decode a serialized name.
    ///
    /// Falls back to a single raw element with the default delimiter when the
    /// meta marker is missing, and to whatever parsed cleanly when an element
    /// tail is malformed.
    pub fn decode(serialized: &str) -> NameHierarchy {
        let meta_pos = match serialized.find(META) {
            Some(pos) => pos,
            None => {
                return NameHierarchy {
                    delimiter: DEFAULT_DELIMITER.to_string(),
                    elements: vec![NameElement::plain(serialized)],
                };
            }
        };

        let delimiter = serialized[..meta_pos].to_string();
        let body = &serialized[meta_pos + META.len()..];

        let mut elements = Vec::new();
        for chunk in body.split(NAME) {
            let Some(part_pos) = chunk.find(PART) else {
                // Malformed tail: keep what parsed so far.
                break;
            };
            let name = &chunk[..part_pos];
            let rest = &chunk[part_pos + PART.len()..];
            let Some(sig_pos) = rest.find(SIG) else {
                break;
            };
            elements.push(NameElement {
                name: name.to_string(),
                prefix: rest[..sig_pos].to_string(),
                postfix: rest[sig_pos + SIG.len()..].to_string(),
            });
        }

        if elements.is_empty() {
            return NameHierarchy {
                delimiter: DEFAULT_DELIMITER.to_string(),
                elements: vec![NameElement::plain(serialized)],
            };
        }

        NameHierarchy {
            delimiter,
            elements,
        }
    }

    /// Serialize this hierarchy back to the stored format.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.delimiter.len() + self.elements.len() * 8);
        out.push_str(&self.delimiter);
        out.push_str(META);
        for (i, elem) in self.elements.iter().enumerate() {
            if i > 0 {
                out.push_str(NAME);
            }
            out.push_str(&elem.name);
            out.push_str(PART);
            out.push_str(&elem.prefix);
            out.push_str(SIG);
            out.push_str(&elem.postfix);
        }
        out
    }

    /// Qualified name: element names joined by the delimiter.
    ///
    /// Prefixes and postfixes are ignored here; see
    /// [`NameHierarchy::qualified_name_with_signature`] when they matter.
    pub fn qualified_name(&self) -> String {
        let mut out = String::new();
        for (i, elem) in self.elements.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.delimiter);
            }
            out.push_str(&elem.name);
        }
        out
    }

    /// Qualified name decorated with the tail element's prefix and postfix.
    pub fn qualified_name_with_signature(&self) -> String {
        let joined = self.qualified_name();
        let Some(last) = self.elements.last() else {
            return joined;
        };
        if last.prefix.is_empty() {
            format!("{}{}", joined, last.postfix)
        } else {
            format!("{} {}{}", last.prefix, joined, last.postfix)
        }
    }

    /// Qualified name of the enclosing element (all but the last), or None
    /// for a single-element hierarchy.
    pub fn parent_qualified_name(&self) -> Option<String> {
        if self.elements.len() < 2 {
            return None;
        }
        let mut out = String::new();
        for (i, elem) in self.elements[..self.elements.len() - 1].iter().enumerate() {
            if i > 0 {
                out.push_str(&self.delimiter);
            }
            out.push_str(&elem.name);
        }
        Some(out)
    }

    /// Simple name: the last element's name.
    pub fn last_name(&self) -> &str {
        self.elements.last().map(|e| e.name.as_str()).unwrap_or("")
    }
}

/// Build the serialized lookup key for a qualified name with empty
/// prefixes/postfixes.
///
/// This is the fast path for exact qualified-name lookups: a symbol whose
/// elements carry no signature serializes to exactly this key, so an equality
/// query on the serialized column finds it without a LIKE scan.
pub fn encode_qualified(names: &[&str], delimiter: &str) -> String {
    let hierarchy = NameHierarchy {
        delimiter: delimiter.to_string(),
        elements: names.iter().map(|n| NameElement::plain(n)).collect(),
    };
    hierarchy.encode()
}
