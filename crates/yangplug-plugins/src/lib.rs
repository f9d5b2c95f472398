//! yangplug type and extension plugins
//!
//! This crate provides the two plugin contracts of yangplug and their
//! reference implementations:
//!
//! - [`types::TypePlugin`] with the built-in [`identityref::Identityref`] type
//! - [`exts::ExtensionPlugin`] with the [`revisions::RevisionLabelScheme`]
//!   extension of `ietf-yang-revisions`
//!
//! Plugins are collected in a [`PluginRegistry`] that the module compiler
//! ([`compile::compile_module`]) and the data entry points
//! ([`data::store_value`]) look them up in.
//!
//! # Example
//!
//! ```
//! use yangplug_plugins::compile::compile_module;
//! use yangplug_plugins::revisions::ietf_yang_revisions;
//! use yangplug_plugins::PluginRegistry;
//! use yangplug_schema::parsed::{ParsedExtInstance, ParsedIdentity, ParsedModule};
//! use yangplug_schema::{Context, ExtData};
//!
//! let plugins = PluginRegistry::with_builtins();
//! let mut ctx = Context::new();
//! compile_module(&mut ctx, &plugins, &ietf_yang_revisions(), false).unwrap();
//!
//! let module = ParsedModule::builder("a", "urn:tests:extensions:revisions:a", "a")
//!     .import("ietf-yang-revisions", "rev")
//!     .identity(ParsedIdentity::new("testver-scheme").base("rev:revision-label-scheme-base"))
//!     .ext(ParsedExtInstance::new("rev:revision-label-scheme").argument("testver-scheme"))
//!     .build();
//! let id = compile_module(&mut ctx, &plugins, &module, true).unwrap();
//!
//! let compiled = ctx.module(id).unwrap();
//! assert_eq!(compiled.exts.len(), 1);
//! assert!(matches!(compiled.exts[0].data, Some(ExtData::RevisionLabelScheme(_))));
//! ```

pub mod compile;
pub mod data;
pub mod exts;
pub mod identityref;
pub mod registry;
pub mod revisions;
pub mod types;

// Re-export commonly used types at the crate root
pub use compile::compile_module;
pub use data::{free_value, store_lyb_value, store_value, RawValue};
pub use exts::{ExtCompileCtx, ExtRecord, ExtensionPlugin};
pub use registry::{PluginKind, PluginMetadata, PluginRegistry};
pub use types::{StoreRequest, Stored, TypePlugin, TypeRecord};
