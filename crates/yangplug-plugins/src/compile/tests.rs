use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use yangplug_schema::parsed::{ParsedFeature, ParsedIdentity};
use yangplug_schema::{ContextOptions, ExtData};

use super::*;
use crate::exts::{ExtCompileCtx, ExtRecord, ExtensionPlugin};

fn compile(ctx: &mut Context, module: &ParsedModule) -> Result<ModuleId, Diagnostic> {
    compile_module(ctx, &PluginRegistry::with_builtins(), module, true)
}

fn builder(name: &str) -> yangplug_schema::parsed::ParsedModuleBuilder {
    ParsedModule::builder(name, format!("urn:{}", name), name)
}

fn expect_error(module: &ParsedModule) -> Diagnostic {
    let mut ctx = Context::new();
    let err = compile(&mut ctx, module).unwrap_err();
    assert!(ctx.modules().is_empty());
    assert_eq!(ctx.last_error().as_ref(), Some(&err));
    err
}

#[test]
fn test_compile_identities_and_leaves() {
    let mut ctx = Context::new();
    let module = builder("m")
        .revision("2024-01-31")
        .identity(ParsedIdentity::new("derived").base("base"))
        .identity(ParsedIdentity::new("base"))
        .leaf(ParsedLeaf::identityref("l", "m:derived"))
        .leaf(ParsedLeaf::new("s", "string"))
        .build();
    let id = compile(&mut ctx, &module).unwrap();

    let compiled = ctx.module(id).unwrap();
    assert!(compiled.implemented);
    assert_eq!(compiled.display_name(), "m@2024-01-31");
    let base = compiled.find_identity("base").unwrap();
    let derived = compiled.find_identity("derived").unwrap();
    assert_eq!(compiled.identities[derived.index as usize].bases, vec![base]);
    assert!(ctx.is_derived(base, derived));

    match *compiled.nodes[0].ty {
        CompiledType::Identityref(ref ty) => assert_eq!(ty.bases(), &[derived]),
        ref other => panic!("unexpected type {:?}", other),
    }
    assert_eq!(compiled.nodes[1].ty.basetype(), BaseType::String);
}

#[test]
fn test_duplicate_identity() {
    let err = expect_error(
        &builder("m")
            .identity(ParsedIdentity::new("a"))
            .identity(ParsedIdentity::new("a"))
            .build(),
    );
    assert_eq!(err.code, ErrorCode::DuplicateIdentifier);
    assert_eq!(err.message, "Duplicate identifier \"a\" of identity statement.");
    assert_eq!(err.path.as_deref(), Some("/m:{identity='a'}"));
}

#[test]
fn test_unresolved_base() {
    let err = expect_error(&builder("m").identity(ParsedIdentity::new("a").base("x:b")).build());
    assert_eq!(err.code, ErrorCode::UnresolvedBase);
    assert_eq!(err.message, "Unable to find base (x:b) of identity \"a\".");
    assert_eq!(err.path.as_deref(), Some("/m:{identity='a'}"));
}

#[test]
fn test_derivation_cycles() {
    let err = expect_error(
        &builder("m")
            .identity(ParsedIdentity::new("a").base("b"))
            .identity(ParsedIdentity::new("b").base("a"))
            .build(),
    );
    assert_eq!(err.code, ErrorCode::DerivationCycle);
    assert_eq!(err.message, "Identity \"a\" is indirectly derived from itself.");

    let err = expect_error(&builder("m").identity(ParsedIdentity::new("a").base("a")).build());
    assert_eq!(err.message, "Identity \"a\" is derived from itself.");
}

#[test]
fn test_import_failed() {
    let err = expect_error(&builder("m").import("missing", "x").build());
    assert_eq!(err.code, ErrorCode::ImportFailed);
    assert_eq!(err.message, "Importing \"missing\" module into \"m\" failed.");
    assert_eq!(err.path.as_deref(), Some("/m"));
}

#[test]
fn test_import_by_revision() {
    let mut ctx = Context::new();
    compile(&mut ctx, &builder("dep").revision("2020-01-01").build()).unwrap();
    let err = compile(&mut ctx, &builder("m").import_revision("dep", "2021-01-01", "d").build())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ImportFailed);
    assert!(compile(&mut ctx, &builder("m").import_revision("dep", "2020-01-01", "d").build()).is_ok());
}

#[test]
fn test_identityref_leaf_errors() {
    let err = expect_error(&builder("m").leaf(ParsedLeaf::new("l", "identityref")).build());
    assert_eq!(err.code, ErrorCode::MissingBase);
    assert_eq!(err.message, "Missing base substatement for identityref type.");
    assert_eq!(err.path.as_deref(), Some("/m:l"));

    let err = expect_error(&builder("m").leaf(ParsedLeaf::identityref("l", "nope")).build());
    assert_eq!(err.code, ErrorCode::UnresolvedBase);
    assert_eq!(err.message, "Unable to find base (nope) of identityref.");

    let err = expect_error(&builder("m").leaf(ParsedLeaf::new("l", "float")).build());
    assert_eq!(err.code, ErrorCode::UnknownType);
}

#[test]
fn test_name_syntax() {
    let err = expect_error(&builder("m").identity(ParsedIdentity::new("1bad")).build());
    assert_eq!(err.code, ErrorCode::InvalidIdentifier);
    assert_eq!(err.message, "Invalid identifier \"1bad\" of identity statement.");

    let err = expect_error(&builder("m").revision("2021-1-1").build());
    assert_eq!(err.code, ErrorCode::InvalidRevision);
}

#[test]
fn test_duplicate_module() {
    let mut ctx = Context::new();
    compile(&mut ctx, &builder("m").build()).unwrap();
    let err = compile(&mut ctx, &builder("m").build()).unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateModule);
    assert_eq!(ctx.modules().len(), 1);
}

#[test]
fn test_features_and_if_features() {
    let options = ContextOptions::default().enable_feature("m", "fast");
    let mut ctx = Context::with_options(options);
    let module = builder("m")
        .feature(ParsedFeature::new("fast"))
        .feature(ParsedFeature::new("slow"))
        .identity(ParsedIdentity::new("a").if_feature(IfFeatureExpr::feature("fast")))
        .identity(ParsedIdentity::new("b").if_feature(IfFeatureExpr::or(
            IfFeatureExpr::feature("slow"),
            IfFeatureExpr::not(IfFeatureExpr::feature("m:fast")),
        )))
        .build();
    let id = compile(&mut ctx, &module).unwrap();
    let compiled = ctx.module(id).unwrap();
    assert!(compiled.features[0].enabled);
    assert!(!compiled.features[1].enabled);
    assert!(ctx.identity_enabled(compiled.find_identity("a").unwrap()));
    assert!(!ctx.identity_enabled(compiled.find_identity("b").unwrap()));
}

#[test]
fn test_feature_conditions_reach_earlier_features() {
    let options = ContextOptions::default()
        .enable_feature("m", "a")
        .enable_feature("m", "b");
    let mut ctx = Context::with_options(options);
    let module = builder("m")
        .feature(ParsedFeature::new("a").if_feature(IfFeatureExpr::feature("b")))
        .feature(ParsedFeature::new("b").if_feature(IfFeatureExpr::feature("c")))
        .feature(ParsedFeature::new("c"))
        .identity(ParsedIdentity::new("i").if_feature(IfFeatureExpr::feature("a")))
        .build();
    let id = compile(&mut ctx, &module).unwrap();
    let compiled = ctx.module(id).unwrap();
    assert!(compiled.features.iter().all(|feature| !feature.enabled));
    assert!(!ctx.identity_enabled(compiled.find_identity("i").unwrap()));

    let options = ContextOptions::default()
        .enable_feature("m", "a")
        .enable_feature("m", "b")
        .enable_feature("m", "c");
    let mut ctx = Context::with_options(options);
    let id = compile(&mut ctx, &module).unwrap();
    let compiled = ctx.module(id).unwrap();
    assert!(compiled.features.iter().all(|feature| feature.enabled));
    assert!(ctx.identity_enabled(compiled.find_identity("i").unwrap()));
}

#[test]
fn test_unknown_if_feature() {
    let err = expect_error(
        &builder("m")
            .identity(ParsedIdentity::new("a").if_feature(IfFeatureExpr::feature("ghost")))
            .build(),
    );
    assert_eq!(err.code, ErrorCode::FeatureNotFound);
    assert_eq!(
        err.message,
        "Invalid value \"ghost\" of if-feature - unable to find feature \"ghost\"."
    );
}

#[test]
fn test_all_implemented_implements_imports() {
    let options = ContextOptions {
        all_implemented: true,
        ..Default::default()
    };
    let mut ctx = Context::with_options(options);
    let plugins = PluginRegistry::with_builtins();
    let dep = compile_module(&mut ctx, &plugins, &builder("dep").build(), false).unwrap();
    assert!(ctx.module(dep).unwrap().implemented);

    let mut ctx = Context::new();
    let dep = compile_module(&mut ctx, &plugins, &builder("dep").build(), false).unwrap();
    compile_module(&mut ctx, &plugins, &builder("m").import("dep", "d").build(), true).unwrap();
    assert!(!ctx.module(dep).unwrap().implemented);
}

#[test]
fn test_extension_without_plugin() {
    let mut ctx = Context::new();
    let module = builder("m")
        .extension("note", Some("text"))
        .extension("flag", None)
        .ext(
            ParsedExtInstance::new("m:note")
                .argument("hello")
                .child(ParsedExtInstance::new("m:flag")),
        )
        .feature(ParsedFeature::new("f").ext(ParsedExtInstance::new("m:flag")))
        .leaf(ParsedLeaf::new("l", "string").ext(ParsedExtInstance::new("m:flag")))
        .build();
    let id = compile(&mut ctx, &module).unwrap();
    let compiled = ctx.module(id).unwrap();

    let note = &compiled.exts[0];
    assert_eq!(note.argument.as_deref(), Some("hello"));
    assert_eq!(note.plugin, None);
    assert_eq!(note.data, None);
    assert_eq!(note.parent_stmt, Stmt::Module);
    assert_eq!(note.substmts.len(), 1);
    assert_eq!(note.substmts[0].parent_stmt, Stmt::ExtensionInstance);

    assert_eq!(compiled.features[0].exts[0].parent_stmt, Stmt::Feature);
    assert_eq!(compiled.nodes[0].exts[0].parent_stmt, Stmt::Leaf);
}

#[test]
fn test_extension_definition_not_found() {
    let err = expect_error(&builder("m").ext(ParsedExtInstance::new("m:nope").argument("x")).build());
    assert_eq!(err.code, ErrorCode::ExtensionNotFound);
    assert_eq!(
        err.message,
        "Extension definition of extension instance \"m:nope\" not found."
    );
    assert_eq!(err.path.as_deref(), Some("/m:{extension='m:nope'}"));
    assert_eq!(err.plugin, None);
}

#[test]
fn test_extension_definitions_are_loaded() {
    let mut ctx = Context::new();
    let module = builder("m")
        .extension("note", Some("text"))
        .extension("flag", None)
        .build();
    let id = compile(&mut ctx, &module).unwrap();
    let compiled = ctx.module(id).unwrap();

    assert_eq!(compiled.extensions.len(), 2);
    assert_eq!(&*compiled.extensions[0].name, "note");
    assert_eq!(compiled.extensions[0].argument.as_deref(), Some("text"));
    assert_eq!(&*compiled.extensions[1].name, "flag");
    assert_eq!(compiled.extensions[1].argument, None);
    let flag = compiled.find_extension("flag").unwrap();
    assert_eq!(flag.module, id);
    assert_eq!(flag.index, 1);
    assert!(compiled.find_extension("ghost").is_none());
}

#[test]
fn test_duplicate_extension_definition() {
    let err = expect_error(
        &builder("m")
            .extension("note", Some("text"))
            .extension("note", None)
            .build(),
    );
    assert_eq!(err.code, ErrorCode::DuplicateIdentifier);
    assert_eq!(
        err.message,
        "Duplicate identifier \"note\" of extension statement."
    );
    assert_eq!(err.path.as_deref(), Some("/m:{extension='note'}"));
}

#[test]
fn test_missing_argument_on_leaf() {
    let err = expect_error(
        &builder("m")
            .extension("note", Some("text"))
            .leaf(ParsedLeaf::new("l", "string").ext(ParsedExtInstance::new("m:note")))
            .build(),
    );
    assert_eq!(err.code, ErrorCode::MissingArgument);
    assert_eq!(err.message, "Extension instance \"m:note\" misses argument \"text\".");
    assert_eq!(err.path.as_deref(), Some("/m:l/{extension='m:note'}"));
}

struct Counting(&'static AtomicUsize);

impl ExtensionPlugin for Counting {
    fn id(&self) -> &'static str {
        "counting"
    }

    fn compile(
        &self,
        _cctx: &mut ExtCompileCtx<'_>,
        _parsed: &ParsedExtInstance,
        _ext: &mut ExtensionInstance,
    ) -> Result<(), Diagnostic> {
        Ok(())
    }

    fn validate(&self, _ctx: &Context, ext: &ExtensionInstance) -> Result<(), Diagnostic> {
        if ext.argument.as_deref() == Some("invalid") {
            return Err(Diagnostic::error(ErrorCode::InvalidPlacement, "rejected"));
        }
        Ok(())
    }

    fn free(&self, _ctx: &Context, ext: &mut ExtensionInstance) {
        self.0.fetch_add(1, Ordering::SeqCst);
        ext.data = None;
    }
}

#[test]
fn test_failed_compile_frees_instances() {
    static FREED: AtomicUsize = AtomicUsize::new(0);
    let mut plugins = PluginRegistry::with_builtins();
    plugins.register_extension(ExtRecord {
        module: "m",
        revision: None,
        name: "note",
        plugin: Box::new(Counting(&FREED)),
    });
    let module = builder("m")
        .extension("note", Some("text"))
        .ext(ParsedExtInstance::new("m:note").argument("one"))
        .identity(ParsedIdentity::new("i").ext(ParsedExtInstance::new("m:note").argument("two")))
        .ext(ParsedExtInstance::new("m:missing"))
        .build();

    let mut ctx = Context::new();
    let err = compile_module(&mut ctx, &plugins, &module, true).unwrap_err();
    assert_eq!(err.code, ErrorCode::ExtensionNotFound);
    assert_eq!(FREED.load(Ordering::SeqCst), 1);
    assert!(ctx.modules().is_empty());
}

#[test]
fn test_validate_failure_is_tagged() {
    static FREED: AtomicUsize = AtomicUsize::new(0);
    let mut plugins = PluginRegistry::with_builtins();
    plugins.register_extension(ExtRecord {
        module: "v",
        revision: None,
        name: "note",
        plugin: Box::new(Counting(&FREED)),
    });
    let module = builder("v")
        .extension("note", Some("text"))
        .ext(ParsedExtInstance::new("v:note").argument("invalid"))
        .build();
    let mut ctx = Context::new();
    let err = compile_module(&mut ctx, &plugins, &module, true).unwrap_err();
    assert_eq!(err.plugin.as_deref(), Some("counting"));
    assert_eq!(err.full_message(), "Extension plugin \"counting\": rejected");
    assert_eq!(err.path.as_deref(), Some("/v"));
    assert_eq!(FREED.load(Ordering::SeqCst), 1);
    assert!(ctx.modules().is_empty());
}

#[test]
fn test_scheme_payload_on_revisions_module() {
    let plugins = PluginRegistry::with_builtins();
    let mut ctx = Context::new();
    compile_module(&mut ctx, &plugins, &crate::revisions::ietf_yang_revisions(), false).unwrap();
    let module = builder("a")
        .import("ietf-yang-revisions", "rev")
        .identity(ParsedIdentity::new("scheme").base("rev:revision-label-scheme-base"))
        .ext(ParsedExtInstance::new("rev:revision-label-scheme").argument("a:scheme"))
        .build();
    let id = compile_module(&mut ctx, &plugins, &module, true).unwrap();
    let compiled = ctx.module(id).unwrap();
    let scheme = compiled.find_identity("scheme").unwrap();
    assert_eq!(compiled.exts[0].data, Some(ExtData::RevisionLabelScheme(scheme)));
    assert_eq!(compiled.exts[0].plugin, Some(crate::revisions::PLUGIN_ID));
}
