//! Compiled extension instances.

use crate::dict::DictStr;
use crate::ident::IdentityId;
use crate::module::{ExtDefId, FeatureId, ModuleId, NodeId, Stmt};

/// The compiled statement an extension instance is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtParent {
    /// Module or submodule top level.
    Module(ModuleId),
    /// An identity.
    Identity(IdentityId),
    /// A feature.
    Feature(FeatureId),
    /// A data node.
    Node(NodeId),
}

impl ExtParent {
    /// Module the parent statement belongs to.
    pub fn module(&self) -> ModuleId {
        match self {
            ExtParent::Module(module) => *module,
            ExtParent::Identity(id) => id.module,
            ExtParent::Feature(id) => id.module,
            ExtParent::Node(id) => id.module,
        }
    }
}

/// Payload an extension plugin attaches to its compiled instance.
///
/// Each variant belongs to exactly one plugin. The compiler carries it
/// without looking inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtData {
    /// Identity naming the revision-label scheme of a module.
    RevisionLabelScheme(IdentityId),
}

/// One compiled use of an extension statement.
#[derive(Debug, Clone)]
pub struct ExtensionInstance {
    /// Definition this instance instantiates.
    pub def: ExtDefId,
    /// Instance name as written, prefix included.
    pub name: DictStr,
    /// Argument value, if any.
    pub argument: Option<DictStr>,
    /// Keyword of the statement the instance is placed in.
    pub parent_stmt: Stmt,
    /// The compiled parent.
    pub parent: ExtParent,
    /// Id of the plugin that compiled the instance.
    pub plugin: Option<&'static str>,
    /// Plugin payload.
    pub data: Option<ExtData>,
    /// Compiled nested extension instances.
    pub substmts: Vec<ExtensionInstance>,
}

impl ExtensionInstance {
    /// Creates an instance with no payload and no substatements.
    pub fn new(def: ExtDefId, name: DictStr, parent_stmt: Stmt, parent: ExtParent) -> Self {
        Self {
            def,
            name,
            argument: None,
            parent_stmt,
            parent,
            plugin: None,
            data: None,
            substmts: Vec::new(),
        }
    }
}
