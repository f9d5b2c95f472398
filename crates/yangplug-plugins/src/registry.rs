//! Plugin registry.
//!
//! The registry is built once, before any module is compiled, and passed to
//! the compiler and the data entry points. Lookup goes by defining module,
//! revision and name; later registrations shadow earlier ones.

use serde::{Deserialize, Serialize};

use crate::exts::{ExtRecord, ExtensionPlugin};
use crate::types::{TypePlugin, TypeRecord};
use crate::{identityref, revisions};

/// Registry of type and extension plugins.
#[derive(Debug)]
pub struct PluginRegistry {
    types: Vec<TypeRecord>,
    extensions: Vec<ExtRecord>,
}

fn record_matches(
    record_module: &str,
    record_revision: Option<&str>,
    record_name: &str,
    module: &str,
    revision: Option<&str>,
    name: &str,
) -> bool {
    record_module == module
        && record_name == name
        && (record_revision.is_none() || record_revision == revision)
}

impl PluginRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Creates a registry with every built-in plugin registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        for record in identityref::records() {
            registry.register_type(record);
        }
        for record in revisions::records() {
            registry.register_extension(record);
        }

        registry
    }

    /// Registers a type plugin.
    pub fn register_type(&mut self, record: TypeRecord) {
        self.types.push(record);
    }

    /// Registers an extension plugin.
    pub fn register_extension(&mut self, record: ExtRecord) {
        self.extensions.push(record);
    }

    /// Finds the plugin of a type. An empty module name selects built-in types,
    /// a record without revision matches any revision.
    pub fn find_type(&self, module: &str, revision: Option<&str>, name: &str) -> Option<&dyn TypePlugin> {
        self.types
            .iter()
            .rev()
            .find(|r| record_matches(r.module, r.revision, r.name, module, revision, name))
            .map(|r| r.plugin.as_ref())
    }

    /// Finds the plugin of an extension.
    pub fn find_extension(
        &self,
        module: &str,
        revision: Option<&str>,
        name: &str,
    ) -> Option<&dyn ExtensionPlugin> {
        self.extensions
            .iter()
            .rev()
            .find(|r| record_matches(r.module, r.revision, r.name, module, revision, name))
            .map(|r| r.plugin.as_ref())
    }

    /// Finds an extension plugin by its id.
    pub fn extension_by_id(&self, id: &str) -> Option<&dyn ExtensionPlugin> {
        self.extensions
            .iter()
            .rev()
            .find(|r| r.plugin.id() == id)
            .map(|r| r.plugin.as_ref())
    }

    /// Returns plugin metadata for documentation/introspection.
    pub fn metadata(&self) -> Vec<PluginMetadata> {
        let types = self.types.iter().map(|r| PluginMetadata {
            kind: PluginKind::Type,
            id: r.plugin.id().to_string(),
            module: r.module.to_string(),
            revision: r.revision.map(String::from),
            name: r.name.to_string(),
        });
        let extensions = self.extensions.iter().map(|r| PluginMetadata {
            kind: PluginKind::Extension,
            id: r.plugin.id().to_string(),
            module: r.module.to_string(),
            revision: r.revision.map(String::from),
            name: r.name.to_string(),
        });
        types.chain(extensions).collect()
    }

    /// Returns the number of registered plugins.
    pub fn len(&self) -> usize {
        self.types.len() + self.extensions.len()
    }

    /// Returns true if no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.extensions.is_empty()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Kind of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    /// Value type plugin.
    Type,
    /// Extension statement plugin.
    Extension,
}

/// Metadata about a registered plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Plugin kind.
    pub kind: PluginKind,
    /// Plugin id string.
    pub id: String,
    /// Defining module, empty for built-in types.
    pub module: String,
    /// Defining module revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Type or extension name.
    pub name: String,
}
