#![no_main]

use libfuzzer_sys::fuzz_target;
use yangplug_plugins::compile::compile_module;
use yangplug_plugins::revisions::ietf_yang_revisions;
use yangplug_plugins::PluginRegistry;
use yangplug_schema::parsed::ParsedModule;
use yangplug_schema::Context;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(module) = ParsedModule::from_json(text) else {
        return;
    };
    let plugins = PluginRegistry::with_builtins();
    let mut ctx = Context::new();
    compile_module(&mut ctx, &plugins, &ietf_yang_revisions(), false).expect("ietf-yang-revisions compiles");
    let _ = compile_module(&mut ctx, &plugins, &module, true);
    // Round trip of anything that parsed must parse again.
    if let Ok(json) = serde_json::to_string(&module) {
        assert!(ParsedModule::from_json(&json).is_ok());
    }
});
