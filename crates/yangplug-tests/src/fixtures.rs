//! Module fixtures for the revision-label-scheme scenarios and identity
//! value tests.

use yangplug_schema::parsed::{ParsedExtInstance, ParsedIdentity, ParsedLeaf, ParsedModule, ParsedModuleBuilder};

/// Extension instance name as module `aa` writes it.
pub const SCHEME_EXT: &str = "rev:revision-label-scheme";

/// Base identity as module `aa` writes it.
pub const SCHEME_BASE: &str = "rev:revision-label-scheme-base";

/// A module importing `ietf-yang-revisions` under prefix `rev`.
pub fn revisions_user(name: &str) -> ParsedModuleBuilder {
    ParsedModule::builder(name, format!("urn:tests:extensions:revisions:{}", name), name)
        .import("ietf-yang-revisions", "rev")
}

/// A scheme identity derived from the scheme base.
pub fn scheme_identity(name: &str) -> ParsedIdentity {
    ParsedIdentity::new(name).base(SCHEME_BASE)
}

/// The extension instance with the given argument.
pub fn scheme(argument: &str) -> ParsedExtInstance {
    ParsedExtInstance::new(SCHEME_EXT).argument(argument)
}

/// Module `a`: one scheme identity and one extension instance naming it.
pub fn valid_scheme_module() -> ParsedModule {
    revisions_user("a")
        .ext(scheme("testver-scheme"))
        .identity(scheme_identity("testver-scheme"))
        .build()
}

/// Same as [`valid_scheme_module`], in the JSON form of a parsed module.
pub const VALID_SCHEME_JSON: &str = r#"{
    "name": "a",
    "namespace": "urn:tests:extensions:revisions:a",
    "prefix": "a",
    "imports": [{ "module": "ietf-yang-revisions", "prefix": "rev" }],
    "identities": [
        { "name": "testver-scheme", "bases": ["rev:revision-label-scheme-base"] }
    ],
    "exts": [
        { "name": "rev:revision-label-scheme", "argument": "testver-scheme" }
    ]
}"#;

/// Module `crypto-base`: an identity hierarchy of crypto algorithms.
///
/// ```text
/// crypto-alg
/// ├── symmetric
/// │   └── aes
/// └── asymmetric
///     └── rsa
/// ```
pub fn crypto_base() -> ParsedModule {
    ParsedModule::builder("crypto-base", "urn:tests:crypto-base", "cb")
        .revision("2024-05-01")
        .identity(ParsedIdentity::new("crypto-alg"))
        .identity(ParsedIdentity::new("symmetric").base("crypto-alg"))
        .identity(ParsedIdentity::new("asymmetric").base("crypto-alg"))
        .identity(ParsedIdentity::new("aes").base("symmetric"))
        .identity(ParsedIdentity::new("rsa").base("asymmetric"))
        .build()
}

/// Module `keys`: leaves referencing the crypto identities, plus an
/// identity of its own that derives from two bases.
pub fn keys() -> ParsedModule {
    ParsedModule::builder("keys", "urn:tests:keys", "k")
        .import("crypto-base", "cb")
        .identity(ParsedIdentity::new("hybrid").base("cb:symmetric").base("cb:asymmetric"))
        .leaf(ParsedLeaf::identityref("alg", "cb:crypto-alg"))
        .leaf(ParsedLeaf::identityref("both", "cb:symmetric").base("cb:asymmetric"))
        .build()
}

/// Same as [`keys`], in the JSON form of a parsed module.
pub const KEYS_JSON: &str = r#"{
    "name": "keys",
    "namespace": "urn:tests:keys",
    "prefix": "k",
    "imports": [{ "module": "crypto-base", "prefix": "cb" }],
    "identities": [
        { "name": "hybrid", "bases": ["cb:symmetric", "cb:asymmetric"] }
    ],
    "leaves": [
        { "name": "alg", "type": "identityref", "bases": ["cb:crypto-alg"] },
        { "name": "both", "type": "identityref", "bases": ["cb:symmetric", "cb:asymmetric"] }
    ]
}"#;
