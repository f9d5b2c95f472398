//! Test harness: a context with the plugin registry and `ietf-yang-revisions`
//! loaded, plus assertions on the diagnostics it logs.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use yangplug_plugins::compile::compile_module;
use yangplug_plugins::revisions::ietf_yang_revisions;
use yangplug_plugins::PluginRegistry;
use yangplug_schema::parsed::ParsedModule;
use yangplug_schema::{Context, ContextOptions, Diagnostic, Module, ModuleId};

static TRACING: OnceLock<()> = OnceLock::new();

/// Installs a test-writer subscriber once per test binary. `RUST_LOG`
/// selects the levels, warnings by default.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A context under test.
pub struct Harness {
    pub ctx: Context,
    pub plugins: PluginRegistry,
}

impl Harness {
    /// Creates a context with default options and `ietf-yang-revisions` loaded.
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    /// Creates a context with the given options and `ietf-yang-revisions` loaded.
    pub fn with_options(options: ContextOptions) -> Self {
        init_tracing();
        let mut harness = Self {
            ctx: Context::with_options(options),
            plugins: PluginRegistry::with_builtins(),
        };
        harness
            .compile(&ietf_yang_revisions(), false)
            .expect("Failed to load ietf-yang-revisions");
        harness
    }

    /// Compiles a module into the context.
    pub fn compile(&mut self, module: &ParsedModule, implement: bool) -> Result<ModuleId, Diagnostic> {
        compile_module(&mut self.ctx, &self.plugins, module, implement)
    }

    /// Compiles and implements a module that must be valid.
    pub fn add(&mut self, module: &ParsedModule) -> ModuleId {
        match self.compile(module, true) {
            Ok(id) => id,
            Err(diag) => panic!("Module \"{}\" failed to compile: {}", module.name, diag),
        }
    }

    /// Returns a loaded module.
    pub fn module(&self, id: ModuleId) -> &Module {
        self.ctx.module(id).expect("Module handle is not loaded")
    }

    /// Compiles a module that must be rejected and checks the logged
    /// message (with plugin tag) and path.
    pub fn assert_rejected(&mut self, module: &ParsedModule, message: &str, path: &str) -> Diagnostic {
        let count = self.ctx.modules().len();
        let err = match self.compile(module, true) {
            Ok(_) => panic!("Expected module \"{}\" to be rejected", module.name),
            Err(err) => err,
        };
        assert_eq!(self.ctx.modules().len(), count, "rejected module stays loaded");
        self.assert_last_error(message, path);
        err
    }

    /// Checks the last logged diagnostic.
    pub fn assert_last_error(&self, message: &str, path: &str) {
        let last = self.ctx.last_error().expect("Expected a logged error");
        assert_eq!(last.full_message(), message, "logged message");
        assert_eq!(last.path.as_deref(), Some(path), "logged path");
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
