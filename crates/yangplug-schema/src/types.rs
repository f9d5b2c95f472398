//! Compiled type descriptors and stored values.

use std::sync::Arc;

use crate::dict::DictStr;
use crate::ident::IdentityId;

/// Built-in YANG base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Binary,
    Bits,
    Boolean,
    Decimal64,
    Empty,
    Enumeration,
    Identityref,
    InstanceIdentifier,
    Int8,
    Int16,
    Int32,
    Int64,
    Leafref,
    String,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Union,
}

impl BaseType {
    const ALL: [BaseType; 19] = [
        BaseType::Binary,
        BaseType::Bits,
        BaseType::Boolean,
        BaseType::Decimal64,
        BaseType::Empty,
        BaseType::Enumeration,
        BaseType::Identityref,
        BaseType::InstanceIdentifier,
        BaseType::Int8,
        BaseType::Int16,
        BaseType::Int32,
        BaseType::Int64,
        BaseType::Leafref,
        BaseType::String,
        BaseType::Uint8,
        BaseType::Uint16,
        BaseType::Uint32,
        BaseType::Uint64,
        BaseType::Union,
    ];

    /// Returns the type name as written in schema text.
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::Binary => "binary",
            BaseType::Bits => "bits",
            BaseType::Boolean => "boolean",
            BaseType::Decimal64 => "decimal64",
            BaseType::Empty => "empty",
            BaseType::Enumeration => "enumeration",
            BaseType::Identityref => "identityref",
            BaseType::InstanceIdentifier => "instance-identifier",
            BaseType::Int8 => "int8",
            BaseType::Int16 => "int16",
            BaseType::Int32 => "int32",
            BaseType::Int64 => "int64",
            BaseType::Leafref => "leafref",
            BaseType::String => "string",
            BaseType::Uint8 => "uint8",
            BaseType::Uint16 => "uint16",
            BaseType::Uint32 => "uint32",
            BaseType::Uint64 => "uint64",
            BaseType::Union => "union",
        }
    }

    /// Parses a built-in type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.name() == name)
    }

    /// Returns true for types whose values are string-encoded in every format.
    pub fn is_string_encoded(&self) -> bool {
        !matches!(
            self,
            BaseType::Boolean
                | BaseType::Empty
                | BaseType::Int8
                | BaseType::Int16
                | BaseType::Int32
                | BaseType::Int64
                | BaseType::Uint8
                | BaseType::Uint16
                | BaseType::Uint32
                | BaseType::Uint64
                | BaseType::Decimal64
                | BaseType::Union
        )
    }
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An `identityref` type restricted to a non-empty set of bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityrefType {
    bases: Vec<IdentityId>,
}

impl IdentityrefType {
    /// Creates the descriptor. Returns `None` for an empty base set.
    pub fn new(bases: Vec<IdentityId>) -> Option<Self> {
        if bases.is_empty() {
            None
        } else {
            Some(Self { bases })
        }
    }

    /// Bases every accepted value must be derived from.
    pub fn bases(&self) -> &[IdentityId] {
        &self.bases
    }
}

/// A compiled type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledType {
    /// Identity reference.
    Identityref(IdentityrefType),
    /// Any other built-in type, without restrictions.
    Other(BaseType),
}

impl CompiledType {
    /// Returns the built-in type this type derives from.
    pub fn basetype(&self) -> BaseType {
        match self {
            CompiledType::Identityref(_) => BaseType::Identityref,
            CompiledType::Other(base) => *base,
        }
    }
}

/// Shared handle of a compiled type. Two values have the same type iff their
/// handles point at the same descriptor.
pub type TypeRef = Arc<CompiledType>;

/// Type-specific part of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePayload {
    /// The canonical string is the whole value.
    None,
    /// Resolved identity of an identityref value.
    Identity(IdentityId),
}

/// A value in its canonical in-memory form.
///
/// Not `Clone`: copies go through the type plugin's duplicate operation so the
/// canonical string is accounted for in the dictionary. Values must be handed
/// back to the plugin's free operation; a value that is only dropped keeps its
/// canonical string interned until [`Dictionary::purge_unused`] runs.
///
/// [`Dictionary::purge_unused`]: crate::dict::Dictionary::purge_unused
#[derive(Debug)]
pub struct StoredValue {
    /// Type the value was stored with.
    pub realtype: TypeRef,
    /// Interned canonical string.
    pub canonical: DictStr,
    /// Type-specific payload.
    pub payload: ValuePayload,
}

impl StoredValue {
    /// Returns the resolved identity of an identityref value.
    pub fn identity(&self) -> Option<IdentityId> {
        match self.payload {
            ValuePayload::Identity(id) => Some(id),
            ValuePayload::None => None,
        }
    }

    /// Returns true if both values were stored with the same type descriptor.
    pub fn same_type(&self, other: &StoredValue) -> bool {
        Arc::ptr_eq(&self.realtype, &other.realtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basetype_names() {
        for ty in BaseType::ALL {
            assert_eq!(BaseType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(BaseType::from_name("identityref"), Some(BaseType::Identityref));
        assert_eq!(BaseType::from_name("float"), None);
    }

    #[test]
    fn test_identityref_requires_base() {
        assert!(IdentityrefType::new(Vec::new()).is_none());
    }

    #[test]
    fn test_string_encoded() {
        assert!(BaseType::Identityref.is_string_encoded());
        assert!(!BaseType::Uint8.is_string_encoded());
    }
}
