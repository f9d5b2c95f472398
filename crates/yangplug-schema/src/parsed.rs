//! Parsed (not yet compiled) schema tree.
//!
//! This is the input of the module compiler. It is produced by a schema
//! parser, loaded from JSON, or built in code with [`ParsedModule::builder`].
//!
//! ```
//! use yangplug_schema::parsed::{ParsedExtInstance, ParsedIdentity, ParsedModule};
//!
//! let module = ParsedModule::builder("a", "urn:tests:a", "a")
//!     .import("ietf-yang-revisions", "rev")
//!     .identity(ParsedIdentity::new("testver-scheme").base("rev:revision-label-scheme-base"))
//!     .ext(ParsedExtInstance::new("rev:revision-label-scheme").argument("testver-scheme"))
//!     .build();
//! assert_eq!(module.identities.len(), 1);
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::module::Status;

/// YANG identifier syntax.
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.-]*$";

/// Revision date syntax.
const REVISION_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
static REVISION_REGEX: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_REGEX.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("invalid regex pattern"))
}

fn revision_regex() -> &'static Regex {
    REVISION_REGEX.get_or_init(|| Regex::new(REVISION_PATTERN).expect("invalid regex pattern"))
}

/// Checks if a name is a valid YANG identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// Checks if a revision is a `YYYY-MM-DD` date.
pub fn is_valid_revision(revision: &str) -> bool {
    revision_regex().is_match(revision)
}

/// A parsed module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedModule {
    /// Module name.
    pub name: String,
    /// Latest revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// XML namespace.
    pub namespace: String,
    /// Own prefix.
    pub prefix: String,
    /// Imported modules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ParsedImport>,
    /// Feature declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<ParsedFeature>,
    /// Identity declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<ParsedIdentity>,
    /// Extension definitions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<ParsedExtensionDef>,
    /// Leaf declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaves: Vec<ParsedLeaf>,
    /// Top-level extension instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exts: Vec<ParsedExtInstance>,
}

impl ParsedModule {
    /// Creates a new module builder.
    pub fn builder(
        name: impl Into<String>,
        namespace: impl Into<String>,
        prefix: impl Into<String>,
    ) -> ParsedModuleBuilder {
        ParsedModuleBuilder::new(name, namespace, prefix)
    }

    /// Parses a module from JSON.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(SchemaError::Module)
    }

    /// Serializes the module to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(SchemaError::Module)
    }
}

/// Builder for [`ParsedModule`].
#[derive(Debug, Clone)]
pub struct ParsedModuleBuilder {
    module: ParsedModule,
}

impl ParsedModuleBuilder {
    /// Creates a new module builder.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            module: ParsedModule {
                name: name.into(),
                revision: None,
                namespace: namespace.into(),
                prefix: prefix.into(),
                imports: Vec::new(),
                features: Vec::new(),
                identities: Vec::new(),
                extensions: Vec::new(),
                leaves: Vec::new(),
                exts: Vec::new(),
            },
        }
    }

    /// Sets the revision.
    pub fn revision(mut self, revision: impl Into<String>) -> Self {
        self.module.revision = Some(revision.into());
        self
    }

    /// Imports the latest revision of a module.
    pub fn import(mut self, module: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.module.imports.push(ParsedImport {
            module: module.into(),
            prefix: prefix.into(),
            revision: None,
        });
        self
    }

    /// Imports a specific revision of a module.
    pub fn import_revision(
        mut self,
        module: impl Into<String>,
        revision: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        self.module.imports.push(ParsedImport {
            module: module.into(),
            prefix: prefix.into(),
            revision: Some(revision.into()),
        });
        self
    }

    /// Declares a feature.
    pub fn feature(mut self, feature: ParsedFeature) -> Self {
        self.module.features.push(feature);
        self
    }

    /// Declares an identity.
    pub fn identity(mut self, identity: ParsedIdentity) -> Self {
        self.module.identities.push(identity);
        self
    }

    /// Defines an extension.
    pub fn extension(mut self, name: impl Into<String>, argument: Option<&str>) -> Self {
        self.module.extensions.push(ParsedExtensionDef {
            name: name.into(),
            argument: argument.map(String::from),
        });
        self
    }

    /// Declares a leaf.
    pub fn leaf(mut self, leaf: ParsedLeaf) -> Self {
        self.module.leaves.push(leaf);
        self
    }

    /// Adds a top-level extension instance.
    pub fn ext(mut self, ext: ParsedExtInstance) -> Self {
        self.module.exts.push(ext);
        self
    }

    /// Builds the module.
    pub fn build(self) -> ParsedModule {
        self.module
    }
}

/// An `import` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedImport {
    /// Imported module name.
    pub module: String,
    /// Prefix bound to the imported module.
    pub prefix: String,
    /// Required revision, latest if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

/// An if-feature expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfFeatureExpr {
    /// A feature name, optionally prefixed.
    Feature(String),
    /// Negation.
    Not(Box<IfFeatureExpr>),
    /// Conjunction.
    And(Box<IfFeatureExpr>, Box<IfFeatureExpr>),
    /// Disjunction.
    Or(Box<IfFeatureExpr>, Box<IfFeatureExpr>),
}

impl IfFeatureExpr {
    /// A single feature reference.
    pub fn feature(name: impl Into<String>) -> Self {
        IfFeatureExpr::Feature(name.into())
    }

    /// Negates an expression.
    pub fn not(expr: IfFeatureExpr) -> Self {
        IfFeatureExpr::Not(Box::new(expr))
    }

    /// Conjunction of two expressions.
    pub fn and(left: IfFeatureExpr, right: IfFeatureExpr) -> Self {
        IfFeatureExpr::And(Box::new(left), Box::new(right))
    }

    /// Disjunction of two expressions.
    pub fn or(left: IfFeatureExpr, right: IfFeatureExpr) -> Self {
        IfFeatureExpr::Or(Box::new(left), Box::new(right))
    }
}

/// A `feature` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedFeature {
    /// Feature name.
    pub name: String,
    /// if-feature expressions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<IfFeatureExpr>,
    /// Extension instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exts: Vec<ParsedExtInstance>,
}

impl ParsedFeature {
    /// Creates a feature.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            if_features: Vec::new(),
            exts: Vec::new(),
        }
    }

    /// Adds an if-feature expression.
    pub fn if_feature(mut self, expr: IfFeatureExpr) -> Self {
        self.if_features.push(expr);
        self
    }

    /// Adds an extension instance.
    pub fn ext(mut self, ext: ParsedExtInstance) -> Self {
        self.exts.push(ext);
        self
    }
}

/// An `identity` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedIdentity {
    /// Identity name.
    pub name: String,
    /// Base identities as qualified names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    /// Status.
    #[serde(default)]
    pub status: Status,
    /// if-feature expressions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<IfFeatureExpr>,
    /// Extension instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exts: Vec<ParsedExtInstance>,
}

impl ParsedIdentity {
    /// Creates an identity without bases.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            status: Status::Current,
            if_features: Vec::new(),
            exts: Vec::new(),
        }
    }

    /// Adds a base.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    /// Sets the status.
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Adds an if-feature expression.
    pub fn if_feature(mut self, expr: IfFeatureExpr) -> Self {
        self.if_features.push(expr);
        self
    }

    /// Adds an extension instance.
    pub fn ext(mut self, ext: ParsedExtInstance) -> Self {
        self.exts.push(ext);
        self
    }
}

/// An `extension` definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedExtensionDef {
    /// Extension name.
    pub name: String,
    /// Argument name, if the extension takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
}

/// A `leaf` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedLeaf {
    /// Leaf name.
    pub name: String,
    /// Built-in type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// identityref bases as qualified names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    /// Status.
    #[serde(default)]
    pub status: Status,
    /// Extension instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exts: Vec<ParsedExtInstance>,
}

impl ParsedLeaf {
    /// Creates a leaf of a built-in type.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            bases: Vec::new(),
            status: Status::Current,
            exts: Vec::new(),
        }
    }

    /// Creates an identityref leaf with one base.
    pub fn identityref(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self::new(name, "identityref").base(base)
    }

    /// Adds an identityref base.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    /// Sets the status.
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Adds an extension instance.
    pub fn ext(mut self, ext: ParsedExtInstance) -> Self {
        self.exts.push(ext);
        self
    }
}

/// One use of an extension statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedExtInstance {
    /// Prefixed extension name as written.
    pub name: String,
    /// Argument value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    /// Nested extension instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParsedExtInstance>,
}

impl ParsedExtInstance {
    /// Creates an instance without argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: None,
            children: Vec::new(),
        }
    }

    /// Sets the argument.
    pub fn argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    /// Adds a nested instance.
    pub fn child(mut self, child: ParsedExtInstance) -> Self {
        self.children.push(child);
        self
    }
}
