#![no_main]

use std::borrow::Cow;
use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use yangplug_plugins::compile::compile_module;
use yangplug_plugins::{free_value, store_lyb_value, store_value, PluginRegistry, RawValue};
use yangplug_schema::parsed::{ParsedIdentity, ParsedLeaf, ParsedModule};
use yangplug_schema::{Context, ContextOptions, NodeId, Unres, XmlNamespaces};

struct Target {
    ctx: Context,
    plugins: PluginRegistry,
    node: NodeId,
    namespaces: XmlNamespaces,
}

fn target() -> &'static Target {
    static TARGET: OnceLock<Target> = OnceLock::new();
    TARGET.get_or_init(|| {
        let plugins = PluginRegistry::with_builtins();
        let options = ContextOptions {
            ref_implemented: true,
            ..Default::default()
        };
        let mut ctx = Context::with_options(options);
        let base = ParsedModule::builder("base", "urn:fuzz:base", "b")
            .identity(ParsedIdentity::new("root"))
            .identity(ParsedIdentity::new("child").base("root"))
            .build();
        compile_module(&mut ctx, &plugins, &base, false).expect("base module compiles");
        let module = ParsedModule::builder("m", "urn:fuzz:m", "m")
            .import("base", "b")
            .identity(ParsedIdentity::new("local").base("b:root"))
            .leaf(ParsedLeaf::identityref("l", "b:root"))
            .build();
        let id = compile_module(&mut ctx, &plugins, &module, true).expect("fuzz module compiles");
        Target {
            ctx,
            plugins,
            node: NodeId { module: id, index: 0 },
            namespaces: XmlNamespaces::new()
                .with_default("urn:fuzz:m")
                .with_prefix("b", "urn:fuzz:base"),
        }
    })
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, value)) = data.split_first() else {
        return;
    };
    let t = target();
    let mut unres = Unres::new();
    let stored = match selector % 4 {
        0 => store_value(&t.ctx, &t.plugins, t.node, RawValue::xml(Cow::Borrowed(value), &t.namespaces), &mut unres),
        1 => store_value(&t.ctx, &t.plugins, t.node, RawValue::json(Cow::Borrowed(value)), &mut unres),
        2 => store_value(&t.ctx, &t.plugins, t.node, RawValue::canonical(Cow::Borrowed(value)), &mut unres),
        _ => store_lyb_value(&t.ctx, &t.plugins, t.node, value, &mut unres),
    };
    if let Ok(stored) = stored {
        free_value(&t.ctx, &t.plugins, t.node, stored);
    }
    t.ctx.clear_errors();
});
