use std::borrow::Cow;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use yangplug_schema::parsed::{IfFeatureExpr, ParsedFeature, ParsedIdentity, ParsedLeaf, ParsedModule};
use yangplug_schema::{BaseType, ModuleId, Status, ValueHints, XmlNamespaces};

use super::*;
use crate::compile::compile_module;
use crate::registry::PluginRegistry;

struct Fixture {
    ctx: Context,
    m: ModuleId,
    n: ModuleId,
    ty: TypeRef,
}

fn fixture() -> Fixture {
    let plugins = PluginRegistry::with_builtins();
    let mut ctx = Context::new();

    let m = ParsedModule::builder("m", "urn:m", "mp")
        .feature(ParsedFeature::new("fast"))
        .identity(ParsedIdentity::new("base"))
        .identity(ParsedIdentity::new("derived").base("base"))
        .identity(ParsedIdentity::new("old").base("base").status(Status::Deprecated))
        .identity(
            ParsedIdentity::new("gated")
                .base("base")
                .if_feature(IfFeatureExpr::feature("fast")),
        )
        .identity(ParsedIdentity::new("other"))
        .leaf(ParsedLeaf::identityref("l", "base"))
        .build();
    let m = compile_module(&mut ctx, &plugins, &m, true).unwrap();

    let n = ParsedModule::builder("n", "urn:n", "np")
        .import("m", "m")
        .identity(ParsedIdentity::new("nid").base("m:base"))
        .build();
    let n = compile_module(&mut ctx, &plugins, &n, false).unwrap();

    let ty = Arc::clone(&ctx.module(m).unwrap().nodes[0].ty);
    Fixture { ctx, m, n, ty }
}

fn json<'a>(value: &str) -> StoreRequest<'a, '_> {
    StoreRequest::new(value.as_bytes(), ValueFormat::Json, PrefixData::Module(None))
}

#[test]
fn test_store_json() {
    let f = fixture();
    let stored = Identityref.store(&f.ctx, &f.ty, json("m:derived")).unwrap();
    assert!(stored.pending.is_none());
    assert_eq!(stored.value.canonical, "m:derived");
    let expected = f.ctx.module(f.m).unwrap().find_identity("derived");
    assert_eq!(stored.value.identity(), expected);
}

#[test]
fn test_store_canonical_takes_ownership() {
    let f = fixture();
    let request = StoreRequest::new(b"m:derived".to_vec(), ValueFormat::Canonical, PrefixData::Module(None))
        .options(StoreOptions::DYNAMIC);
    let stored = Identityref.store(&f.ctx, &f.ty, request).unwrap();
    assert_eq!(stored.value.canonical, "m:derived");
    assert!(f.ctx.dict().contains("m:derived"));
}

#[test]
fn test_xml_and_json_compare_equal() {
    let f = fixture();
    let ns = XmlNamespaces::new().with_prefix("x", "urn:m");
    let from_xml = Identityref
        .store(
            &f.ctx,
            &f.ty,
            StoreRequest::new("x:derived".as_bytes(), ValueFormat::Xml, PrefixData::Xml(&ns)),
        )
        .unwrap();
    let from_json = Identityref.store(&f.ctx, &f.ty, json("m:derived")).unwrap();
    assert_eq!(from_xml.value.canonical, "m:derived");
    assert!(Identityref.compare(&from_xml.value, &from_json.value));

    let other_type: TypeRef = Arc::new((*f.ty).clone());
    let retyped = Identityref.store(&f.ctx, &other_type, json("m:derived")).unwrap();
    assert!(!Identityref.compare(&retyped.value, &from_json.value));
}

#[test]
fn test_store_not_derived() {
    let f = fixture();
    let err = Identityref.store(&f.ctx, &f.ty, json("m:other")).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotDerived);
    assert_eq!(
        err.message,
        "Invalid identityref \"m:other\" value - identity not derived from the base \"m:base\"."
    );
}

#[test]
fn test_store_non_implemented_module() {
    let f = fixture();
    let err = Identityref.store(&f.ctx, &f.ty, json("n:nid")).unwrap_err();
    assert_eq!(err.code, ErrorCode::IdentityInNonImplementedModule);
    assert_eq!(
        err.message,
        "Invalid identityref \"n:nid\" value - identity found in non-implemented module \"n\"."
    );

    let stored = Identityref
        .store(&f.ctx, &f.ty, json("n:nid").options(StoreOptions::IMPLEMENT))
        .unwrap();
    assert_eq!(stored.pending, Some(PendingImplement(f.n)));
    assert_eq!(stored.value.canonical, "n:nid");
}

#[test]
fn test_store_disabled_by_feature() {
    let f = fixture();
    let err = Identityref.store(&f.ctx, &f.ty, json("m:gated")).unwrap_err();
    assert_eq!(err.code, ErrorCode::IdentityDisabledByFeature);
    assert_eq!(
        err.message,
        "Invalid identityref \"m:gated\" value - identity is disabled by if-feature."
    );
}

#[test]
fn test_store_status_violation() {
    let f = fixture();
    let node = f.ctx.module(f.m).unwrap().nodes[0].clone();
    let request = StoreRequest::new("old".as_bytes(), ValueFormat::Schema, PrefixData::Schema(f.m))
        .ctx_node(&node);
    let err = Identityref.store(&f.ctx, &f.ty, request).unwrap_err();
    assert_eq!(err.code, ErrorCode::StatusViolation);
    assert_eq!(
        err.message,
        "A current definition \"l\" is not allowed to reference deprecated value \"old\"."
    );

    // The same reference from JSON data is not a schema reference.
    let request = json("m:old").ctx_node(&node);
    assert!(Identityref.store(&f.ctx, &f.ty, request).is_ok());
}

#[test]
fn test_store_rejects_non_string_hint() {
    let f = fixture();
    let err = Identityref
        .store(&f.ctx, &f.ty, json("m:derived").hints(ValueHints::DECNUM))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedHint);
}

#[test]
fn test_store_wrong_type() {
    let f = fixture();
    let ty: TypeRef = Arc::new(CompiledType::Other(BaseType::String));
    let err = Identityref.store(&f.ctx, &ty, json("m:derived")).unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingTypePlugin);
}

#[test]
fn test_print_formats() {
    let f = fixture();
    let stored = Identityref.store(&f.ctx, &f.ty, json("m:derived")).unwrap();

    let printed = Identityref
        .print(&f.ctx, &stored.value, ValueFormat::Json, &PrefixData::Module(None))
        .unwrap();
    assert!(matches!(printed, Cow::Borrowed("m:derived")));

    let ns = XmlNamespaces::new();
    let printed = Identityref
        .print(&f.ctx, &stored.value, ValueFormat::Xml, &PrefixData::Xml(&ns))
        .unwrap();
    assert!(matches!(printed, Cow::Owned(ref s) if s == "mp:derived"));

    let ns = XmlNamespaces::new().with_prefix("y", "urn:m");
    let printed = Identityref
        .print(&f.ctx, &stored.value, ValueFormat::Xml, &PrefixData::Xml(&ns))
        .unwrap();
    assert_eq!(printed, "y:derived");

    let ns = XmlNamespaces::new().with_default("urn:m");
    let printed = Identityref
        .print(&f.ctx, &stored.value, ValueFormat::Xml, &PrefixData::Xml(&ns))
        .unwrap();
    assert_eq!(printed, "derived");

    let printed = Identityref
        .print(&f.ctx, &stored.value, ValueFormat::Schema, &PrefixData::Schema(f.n))
        .unwrap();
    assert_eq!(printed, "m:derived");
}

#[test]
fn test_duplicate_and_free() {
    let f = fixture();
    let stored = Identityref.store(&f.ctx, &f.ty, json("m:derived")).unwrap();
    let copy = Identityref.duplicate(&f.ctx, &stored.value);
    assert!(Identityref.compare(&copy, &stored.value));

    Identityref.free(&f.ctx, copy);
    assert!(f.ctx.dict().contains("m:derived"));
    Identityref.free(&f.ctx, stored.value);
    assert!(!f.ctx.dict().contains("m:derived"));
}

#[test]
fn test_record() {
    let records = records();
    assert_eq!(records[0].module, "");
    assert_eq!(records[0].name, "identityref");
    assert_eq!(records[0].plugin.lyb_data_len(), None);
}
