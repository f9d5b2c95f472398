//! yangplug compiled schema model
//!
//! This crate holds the data every plugin works against: the context with its
//! interned-string dictionary and module table, the identity registry, value
//! formats with their prefix resolution, compiled types and stored values,
//! compiled extension instances, and the parsed schema tree modules are
//! compiled from.
//!
//! # Example
//!
//! ```
//! use yangplug_schema::{Context, ContextOptions, Module, PrefixData, ValueFormat};
//! use yangplug_schema::ident::Identity;
//! use yangplug_schema::Status;
//!
//! let mut ctx = Context::with_options(ContextOptions::default());
//! let mut module = Module::new(ctx.intern("m"), ctx.intern("urn:m"), ctx.intern("m"));
//! module.implemented = true;
//! let id = ctx.add_module(module).unwrap();
//!
//! let name = ctx.intern("base");
//! ctx.module_mut(id).unwrap().identities.push(Identity {
//!     name,
//!     module: id,
//!     bases: Vec::new(),
//!     status: Status::Current,
//!     if_features: Vec::new(),
//!     exts: Vec::new(),
//! });
//!
//! let base = ctx
//!     .find_identity("m:base", ValueFormat::Json, &PrefixData::Module(None))
//!     .unwrap();
//! assert!(ctx.is_derived(base, base));
//! ```
//!
//! # Modules
//!
//! - [`context`]: The context and its diagnostic log
//! - [`dict`]: Interned strings
//! - [`error`]: Error codes and diagnostics
//! - [`ext`]: Compiled extension instances
//! - [`format`]: Value formats, prefix resolution and LYB framing
//! - [`ident`]: Identity registry
//! - [`module`]: Modules and schema statements
//! - [`options`]: Context and store options
//! - [`parsed`]: Parsed schema tree and its builder
//! - [`path`]: Context paths for diagnostics
//! - [`types`]: Compiled types and stored values
//! - [`unres`]: Deferred module implementation

pub mod context;
pub mod dict;
pub mod error;
pub mod ext;
pub mod format;
pub mod ident;
pub mod module;
pub mod options;
pub mod parsed;
pub mod path;
pub mod types;
pub mod unres;

// Re-export commonly used types at the crate root
pub use context::Context;
pub use dict::{DictStr, Dictionary};
pub use error::{Diagnostic, ErrorClass, ErrorCode, SchemaError, Severity};
pub use ext::{ExtData, ExtParent, ExtensionInstance};
pub use format::{split_qname, PrefixData, ValueFormat, XmlNamespaces};
pub use ident::{IdentityId, IfFeature};
pub use module::{
    ExtDefId, ExtensionDef, Feature, FeatureId, Import, Module, ModuleId, NodeId, SchemaNode,
    Status, Stmt,
};
pub use options::{ContextOptions, StoreOptions, ValueHints, ALL_FEATURES};
pub use parsed::ParsedModule;
pub use path::SchemaPath;
pub use types::{BaseType, CompiledType, IdentityrefType, StoredValue, TypeRef, ValuePayload};
pub use unres::{PendingImplement, Unres};
