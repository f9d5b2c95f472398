//! Value formats and the prefix resolution each of them uses.

use std::collections::BTreeMap;

use crate::context::Context;
use crate::module::ModuleId;

/// Representation a value is read from or printed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFormat {
    /// Canonical in-memory form, module names as prefixes.
    Canonical,
    /// Schema text: prefixes come from the module's imports.
    Schema,
    /// XML: prefixes are bound to namespaces.
    Xml,
    /// JSON: module names as prefixes.
    Json,
    /// Compact binary form carrying canonical bytes.
    Lyb,
}

impl ValueFormat {
    /// Returns true for formats whose printed form equals the canonical string.
    pub fn prints_canonical(&self) -> bool {
        matches!(
            self,
            ValueFormat::Canonical | ValueFormat::Json | ValueFormat::Lyb
        )
    }

    /// Returns true for formats whose prefixes are module names.
    pub fn uses_module_names(&self) -> bool {
        self.prints_canonical()
    }
}

/// Prefix bindings in effect for an XML value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNamespaces {
    default: Option<String>,
    prefixes: BTreeMap<String, String>,
}

impl XmlNamespaces {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default namespace (`xmlns="..."`).
    pub fn with_default(mut self, uri: impl Into<String>) -> Self {
        self.default = Some(uri.into());
        self
    }

    /// Binds a prefix to a namespace (`xmlns:p="..."`).
    pub fn with_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), uri.into());
        self
    }

    /// Returns the namespace bound to `prefix`, or the default one for `None`.
    pub fn namespace(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some(prefix) => self.prefixes.get(prefix).map(String::as_str),
            None => self.default.as_deref(),
        }
    }

    /// Returns the binding of `uri`: `Some(Some(prefix))` for a prefixed one,
    /// `Some(None)` if it is only the default namespace.
    pub fn prefix_for(&self, uri: &str) -> Option<Option<&str>> {
        if let Some((prefix, _)) = self.prefixes.iter().find(|(_, bound)| *bound == uri) {
            return Some(Some(prefix.as_str()));
        }
        (self.default.as_deref() == Some(uri)).then_some(None)
    }
}

/// Format-specific data needed to map a prefix to a module.
#[derive(Debug, Clone, Copy)]
pub enum PrefixData<'a> {
    /// Module-name prefixes (canonical, JSON, LYB). Unprefixed names belong to
    /// the module of the context node, if any.
    Module(Option<ModuleId>),
    /// Schema prefixes of the module being compiled.
    Schema(ModuleId),
    /// XML namespace bindings of the enclosing element.
    Xml(&'a XmlNamespaces),
}

impl<'a> PrefixData<'a> {
    /// Maps an optional prefix to a module of `ctx`.
    ///
    /// Returns `None` if the prefix is unknown or if the data does not belong to `format`.
    pub fn resolve(&self, ctx: &Context, format: ValueFormat, prefix: Option<&str>) -> Option<ModuleId> {
        match (format, self) {
            (ValueFormat::Canonical | ValueFormat::Json | ValueFormat::Lyb, PrefixData::Module(default)) => {
                match prefix {
                    Some(name) => ctx
                        .get_module_implemented(name)
                        .or_else(|| ctx.get_module_latest(name)),
                    None => *default,
                }
            }
            (ValueFormat::Schema, PrefixData::Schema(module)) => {
                let module = ctx.module(*module)?;
                match prefix {
                    Some(prefix) => module.resolve_prefix(prefix),
                    None => Some(module.id()),
                }
            }
            (ValueFormat::Xml, PrefixData::Xml(namespaces)) => {
                let uri = namespaces.namespace(prefix)?;
                ctx.module_by_namespace(uri)
            }
            _ => None,
        }
    }

    /// Returns the prefix that refers to `target` in `format`.
    ///
    /// XML prefers the prefix bound to the module's namespace. An empty prefix
    /// means the namespace is the default one and the name stays unqualified.
    /// Without any binding the module's own prefix is returned and the caller
    /// must declare it.
    pub fn prefix_of<'s>(&'s self, ctx: &'s Context, format: ValueFormat, target: ModuleId) -> Option<&'s str> {
        let module = ctx.module(target)?;
        match (format, self) {
            (ValueFormat::Schema, PrefixData::Schema(owner)) => ctx.module(*owner)?.prefix_of(target),
            (ValueFormat::Xml, PrefixData::Xml(namespaces)) => {
                match namespaces.prefix_for(&module.namespace) {
                    Some(Some(prefix)) => Some(prefix),
                    Some(None) => Some(""),
                    None => Some(&module.prefix),
                }
            }
            (ValueFormat::Xml, _) => Some(&module.prefix),
            _ => Some(&module.name),
        }
    }
}

/// Splits a qualified name at the first `:` into prefix and local name.
pub fn split_qname(value: &str) -> (Option<&str>, &str) {
    match value.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, value),
    }
}

/// LYB framing of string-encoded values.
///
/// A framed value is its byte length as a little-endian `u32` followed by the
/// bytes themselves.
pub mod lyb {
    use std::io::Cursor;

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

    use crate::error::{Diagnostic, ErrorCode};

    /// Size of the length header.
    pub const HEADER_LEN: usize = 4;

    /// Reads one framed value, returning it and the remaining input.
    pub fn read_value(input: &[u8]) -> Result<(&[u8], &[u8]), Diagnostic> {
        let mut cursor = Cursor::new(input);
        let len = cursor.read_u32::<LittleEndian>().map_err(|_| {
            Diagnostic::error(
                ErrorCode::MalformedHint,
                format!(
                    "Invalid LYB value - {} bytes are too short for the length header.",
                    input.len()
                ),
            )
        })? as usize;

        let body = &input[HEADER_LEN..];
        if len > body.len() {
            return Err(Diagnostic::error(
                ErrorCode::MalformedHint,
                format!(
                    "Invalid LYB value - declared length {} exceeds the {} remaining bytes.",
                    len,
                    body.len()
                ),
            ));
        }
        Ok(body.split_at(len))
    }

    /// Appends one framed value to `out`.
    pub fn write_value(value: &[u8], out: &mut Vec<u8>) -> Result<(), Diagnostic> {
        let len = u32::try_from(value.len()).map_err(|_| {
            Diagnostic::error(
                ErrorCode::MalformedHint,
                format!("LYB value of {} bytes does not fit the length header.", value.len()),
            )
        })?;
        out.reserve(HEADER_LEN + value.len());
        // Writing into a Vec cannot fail.
        let _ = out.write_u32::<LittleEndian>(len);
        out.extend_from_slice(value);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_frame_and_unframe() {
            let mut out = Vec::new();
            write_value(b"a:b", &mut out).unwrap();
            assert_eq!(out, vec![3, 0, 0, 0, b'a', b':', b'b']);
            let (value, rest) = read_value(&out).unwrap();
            assert_eq!(value, b"a:b");
            assert!(rest.is_empty());
        }

        #[test]
        fn test_short_header() {
            let err = read_value(&[1, 0]).unwrap_err();
            assert_eq!(err.code, ErrorCode::MalformedHint);
        }

        #[test]
        fn test_oversized_length_rejected() {
            let err = read_value(&[0xff, 0xff, 0xff, 0xff, b'x']).unwrap_err();
            assert_eq!(err.code, ErrorCode::MalformedHint);
            assert!(err.message.contains("exceeds the 1 remaining bytes"));
        }

        #[test]
        fn test_trailing_bytes_returned() {
            let (value, rest) = read_value(&[1, 0, 0, 0, b'x', b'y']).unwrap();
            assert_eq!(value, b"x");
            assert_eq!(rest, b"y");
        }
    }
}
