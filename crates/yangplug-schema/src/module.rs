//! Compiled modules and the schema statements they own.

use serde::{Deserialize, Serialize};

use crate::dict::DictStr;
use crate::ext::ExtensionInstance;
use crate::ident::{Identity, IdentityId};
use crate::types::TypeRef;

/// Handle of a module inside its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u32);

impl ModuleId {
    /// Position of the module in the context's module table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Status of a schema definition.
///
/// Ordered from strongest to weakest so that a definition may only reference
/// definitions whose status is not greater than its own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Current definition.
    #[default]
    Current,
    /// Deprecated definition.
    Deprecated,
    /// Obsolete definition.
    Obsolete,
}

impl Status {
    /// Returns the keyword of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Deprecated => "deprecated",
            Status::Obsolete => "obsolete",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Statement kinds that can carry extension instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stmt {
    /// `module`
    Module,
    /// `submodule`
    Submodule,
    /// `identity`
    Identity,
    /// `feature`
    Feature,
    /// `leaf`
    Leaf,
    /// An extension instance nested in another one.
    ExtensionInstance,
}

impl Stmt {
    /// Returns the statement keyword as used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stmt::Module => "module",
            Stmt::Submodule => "submodule",
            Stmt::Identity => "identity",
            Stmt::Feature => "feature",
            Stmt::Leaf => "leaf",
            Stmt::ExtensionInstance => "extension instance",
        }
    }

    /// Returns true for `module` and `submodule`.
    pub fn is_top_level(&self) -> bool {
        matches!(self, Stmt::Module | Stmt::Submodule)
    }
}

impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An `import` resolved to a module of the context.
#[derive(Debug, Clone)]
pub struct Import {
    /// Prefix the importing module uses for the imported one.
    pub prefix: DictStr,
    /// The imported module.
    pub module: ModuleId,
}

/// Handle of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureId {
    /// Owning module.
    pub module: ModuleId,
    /// Position in the module's feature table.
    pub index: u32,
}

/// A compiled `feature`.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature name.
    pub name: DictStr,
    /// Whether the context enabled this feature.
    pub enabled: bool,
    /// Extension instances placed on the feature.
    pub exts: Vec<ExtensionInstance>,
}

/// Handle of an extension definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtDefId {
    /// Module defining the extension.
    pub module: ModuleId,
    /// Position in the module's extension table.
    pub index: u32,
}

/// An `extension` definition.
#[derive(Debug, Clone)]
pub struct ExtensionDef {
    /// Extension name without prefix.
    pub name: DictStr,
    /// Name of the argument, if the extension takes one.
    pub argument: Option<DictStr>,
}

/// Handle of a data schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// Owning module.
    pub module: ModuleId,
    /// Position in the module's node table.
    pub index: u32,
}

/// A compiled data schema node carrying a typed value.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Statement keyword of the node.
    pub keyword: Stmt,
    /// Node name.
    pub name: DictStr,
    /// Owning module.
    pub module: ModuleId,
    /// Status of the node.
    pub status: Status,
    /// Compiled type of the node's value.
    pub ty: TypeRef,
    /// Extension instances placed on the node.
    pub exts: Vec<ExtensionInstance>,
}

/// A module loaded into a context.
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) id: ModuleId,
    /// Module name.
    pub name: DictStr,
    /// Latest revision date, if any.
    pub revision: Option<DictStr>,
    /// XML namespace of the module.
    pub namespace: DictStr,
    /// Prefix the module uses for itself.
    pub prefix: DictStr,
    /// Whether the module's definitions are active for data.
    pub implemented: bool,
    /// Resolved imports.
    pub imports: Vec<Import>,
    /// Features declared by the module.
    pub features: Vec<Feature>,
    /// Identities declared by the module.
    pub identities: Vec<Identity>,
    /// Extension definitions declared by the module.
    pub extensions: Vec<ExtensionDef>,
    /// Data nodes declared by the module.
    pub nodes: Vec<SchemaNode>,
    /// Extension instances placed at the top level of the module.
    pub exts: Vec<ExtensionInstance>,
}

impl Module {
    /// Creates an empty, not implemented module. The context assigns its id when it is added.
    pub fn new(name: DictStr, namespace: DictStr, prefix: DictStr) -> Self {
        Self {
            id: ModuleId(u32::MAX),
            name,
            revision: None,
            namespace,
            prefix,
            implemented: false,
            imports: Vec::new(),
            features: Vec::new(),
            identities: Vec::new(),
            extensions: Vec::new(),
            nodes: Vec::new(),
            exts: Vec::new(),
        }
    }

    /// Returns the module's handle.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Returns `name@revision`, or the name alone.
    pub fn display_name(&self) -> String {
        match self.revision {
            Some(ref revision) => format!("{}@{}", self.name, revision),
            None => self.name.to_string(),
        }
    }

    /// Looks up an identity declared by this module.
    pub fn find_identity(&self, name: &str) -> Option<IdentityId> {
        self.identities
            .iter()
            .position(|ident| ident.name == name)
            .map(|index| IdentityId {
                module: self.id,
                index: index as u32,
            })
    }

    /// Looks up a feature declared by this module.
    pub fn find_feature(&self, name: &str) -> Option<FeatureId> {
        self.features
            .iter()
            .position(|feature| feature.name == name)
            .map(|index| FeatureId {
                module: self.id,
                index: index as u32,
            })
    }

    /// Looks up an extension definition of this module.
    pub fn find_extension(&self, name: &str) -> Option<ExtDefId> {
        self.extensions
            .iter()
            .position(|def| def.name == name)
            .map(|index| ExtDefId {
                module: self.id,
                index: index as u32,
            })
    }

    /// Looks up a data node of this module.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(|index| NodeId {
                module: self.id,
                index: index as u32,
            })
    }

    /// Resolves a prefix through the module's own prefix and its imports.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<ModuleId> {
        if self.prefix == prefix {
            return Some(self.id);
        }
        self.imports
            .iter()
            .find(|import| import.prefix == prefix)
            .map(|import| import.module)
    }

    /// Returns the prefix under which this module refers to `target`.
    pub fn prefix_of(&self, target: ModuleId) -> Option<&str> {
        if target == self.id {
            return Some(&self.prefix);
        }
        self.imports
            .iter()
            .find(|import| import.module == target)
            .map(|import| import.prefix.as_str())
    }
}
