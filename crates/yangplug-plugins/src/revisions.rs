//! `revision-label-scheme` extension of the `ietf-yang-revisions` module.
//!
//! The extension names the identity of the revision-label scheme a module
//! uses. It may appear once, at the top level of a module or submodule, and
//! its argument must be an identity derived from `revision-label-scheme-base`.

use yangplug_schema::parsed::{ParsedExtInstance, ParsedIdentity, ParsedModule};
use yangplug_schema::{Context, Diagnostic, ErrorCode, ExtData, ExtensionInstance, PrefixData, ValueFormat};

use crate::exts::{ExtCompileCtx, ExtRecord, ExtensionPlugin};

/// Module defining the extension.
pub const REVISIONS_NAME: &str = "ietf-yang-revisions";

/// Revision of [`REVISIONS_NAME`] the plugin is registered for.
pub const REVISIONS_REV: &str = "2021-11-04";

/// Name of the extension.
pub const EXTENSION_NAME: &str = "revision-label-scheme";

/// Identity every scheme identity must be derived from.
pub const SCHEME_BASE: &str = "revision-label-scheme-base";

/// Identifying string of the plugin.
pub const PLUGIN_ID: &str = "yangplug - revisions, version 1";

/// The revision-label-scheme extension plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevisionLabelScheme;

/// Registration records of the plugin.
pub fn records() -> Vec<ExtRecord> {
    vec![ExtRecord {
        module: REVISIONS_NAME,
        revision: Some(REVISIONS_REV),
        name: EXTENSION_NAME,
        plugin: Box::new(RevisionLabelScheme),
    }]
}

/// The parts of `ietf-yang-revisions` the plugin relies on.
pub fn ietf_yang_revisions() -> ParsedModule {
    ParsedModule::builder(
        REVISIONS_NAME,
        "urn:ietf:params:xml:ns:yang:ietf-yang-revisions",
        "rev",
    )
    .revision(REVISIONS_REV)
    .extension(EXTENSION_NAME, Some(SCHEME_BASE))
    .extension("revision-label", Some("revision-label"))
    .identity(ParsedIdentity::new(SCHEME_BASE))
    .build()
}

impl ExtensionPlugin for RevisionLabelScheme {
    fn id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn compile(
        &self,
        cctx: &mut ExtCompileCtx<'_>,
        parsed: &ParsedExtInstance,
        ext: &mut ExtensionInstance,
    ) -> Result<(), Diagnostic> {
        if !ext.parent_stmt.is_top_level() {
            return Err(Diagnostic::error(
                ErrorCode::InvalidPlacement,
                format!(
                    "Extension {} is allowed only at the top level of a YANG module or submodule, but it is placed in \"{}\" statement.",
                    parsed.name, ext.parent_stmt
                ),
            ));
        }

        if cctx.siblings.iter().any(|sibling| sibling.def == ext.def) {
            return Err(Diagnostic::error(
                ErrorCode::DuplicateInstance,
                format!("Extension {} is instantiated multiple times.", parsed.name),
            ));
        }

        let missing = || {
            Diagnostic::error(
                ErrorCode::InternalMissingModule,
                format!(
                    "Identity \"{}:{}\" of revision {} is missing from the context.",
                    REVISIONS_NAME, SCHEME_BASE, REVISIONS_REV
                ),
            )
        };
        let revisions = cctx
            .ctx
            .get_module(REVISIONS_NAME, Some(REVISIONS_REV))
            .and_then(|id| cctx.ctx.module(id))
            .ok_or_else(missing)?;
        let base = revisions.find_identity(SCHEME_BASE).ok_or_else(missing)?;

        let argument = ext.argument.as_deref().unwrap_or_default();
        let ident = cctx.ctx.find_identity(
            argument,
            ValueFormat::Schema,
            &PrefixData::Schema(ext.parent.module()),
        )?;
        if !cctx.ctx.is_derived(base, ident) {
            return Err(Diagnostic::error(
                ErrorCode::ArgumentNotDerivedFromBase,
                format!(
                    "Argument of the {} extension must be an identity derived from {}:{}.",
                    parsed.name, revisions.name, SCHEME_BASE
                ),
            ));
        }

        ext.data = Some(ExtData::RevisionLabelScheme(ident));

        cctx.compile_substatements(parsed, ext)
    }

    fn sprinter(&self, ctx: &Context, ext: &ExtensionInstance) -> Option<String> {
        match ext.data {
            Some(ExtData::RevisionLabelScheme(ident)) => ctx.identity_qname(ident),
            _ => None,
        }
    }
}
