//! Extension plugin contract.
//!
//! The module compiler resolves each extension instance to its definition and
//! then hands it to the plugin registered for that definition. The plugin
//! validates the instance and attaches its payload.

use yangplug_schema::parsed::ParsedExtInstance;
use yangplug_schema::{
    split_qname, Context, Diagnostic, ErrorCode, ExtParent, ExtensionInstance, ModuleId,
    SchemaPath, Stmt,
};

use crate::registry::PluginRegistry;

/// State handed to an extension plugin while it compiles one instance.
pub struct ExtCompileCtx<'a> {
    /// The context, with the module being compiled already loaded.
    pub ctx: &'a Context,
    /// Registered plugins.
    pub plugins: &'a PluginRegistry,
    /// Module being compiled.
    pub module: ModuleId,
    /// Path of the instance being compiled.
    pub path: &'a mut SchemaPath,
    /// Instances already compiled on the same parent.
    pub siblings: &'a [ExtensionInstance],
}

impl ExtCompileCtx<'_> {
    /// Compiles the nested instances of `parsed` into `ext.substmts`.
    pub fn compile_substatements(
        &mut self,
        parsed: &ParsedExtInstance,
        ext: &mut ExtensionInstance,
    ) -> Result<(), Diagnostic> {
        let mut compiled = Vec::with_capacity(parsed.children.len());
        for child in &parsed.children {
            let instance = compile_extension_instance(
                self.ctx,
                self.plugins,
                self.module,
                self.path,
                &compiled,
                child,
                Stmt::ExtensionInstance,
                ext.parent,
            );
            match instance {
                Ok(instance) => compiled.push(instance),
                Err(diag) => {
                    free_extension_instances(self.ctx, self.plugins, &mut compiled);
                    return Err(diag);
                }
            }
        }
        ext.substmts = compiled;
        Ok(())
    }
}

/// Operations every extension implementation provides.
pub trait ExtensionPlugin: Send + Sync {
    /// Identifying string used in diagnostics.
    fn id(&self) -> &'static str;

    /// Checks a parsed instance before it is compiled.
    fn parse(&self, _parsed: &ParsedExtInstance) -> Result<(), Diagnostic> {
        Ok(())
    }

    /// Compiles one instance. `ext` already carries its definition, argument
    /// and parent.
    fn compile(
        &self,
        cctx: &mut ExtCompileCtx<'_>,
        parsed: &ParsedExtInstance,
        ext: &mut ExtensionInstance,
    ) -> Result<(), Diagnostic>;

    /// Checks a compiled instance once its whole module is compiled.
    fn validate(&self, _ctx: &Context, _ext: &ExtensionInstance) -> Result<(), Diagnostic> {
        Ok(())
    }

    /// Renders the instance payload for schema printers.
    fn sprinter(&self, _ctx: &Context, _ext: &ExtensionInstance) -> Option<String> {
        None
    }

    /// Releases the instance payload.
    fn free(&self, _ctx: &Context, ext: &mut ExtensionInstance) {
        ext.data = None;
    }
}

/// Registration of an extension plugin.
pub struct ExtRecord {
    /// Module defining the extension.
    pub module: &'static str,
    /// Revision of that module, `None` for any.
    pub revision: Option<&'static str>,
    /// Extension name.
    pub name: &'static str,
    /// The implementation.
    pub plugin: Box<dyn ExtensionPlugin>,
}

impl std::fmt::Debug for ExtRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtRecord")
            .field("module", &self.module)
            .field("revision", &self.revision)
            .field("name", &self.name)
            .field("id", &self.plugin.id())
            .finish()
    }
}

/// Compiles one extension instance placed on `parent`.
///
/// Resolves the definition, checks the argument, then runs the plugin
/// registered for the definition. `siblings` are the instances already
/// compiled on the same parent. Plugin failures come back tagged with the
/// plugin id, and every failure carries the statement path.
#[allow(clippy::too_many_arguments)]
pub fn compile_extension_instance(
    ctx: &Context,
    plugins: &PluginRegistry,
    module: ModuleId,
    path: &mut SchemaPath,
    siblings: &[ExtensionInstance],
    parsed: &ParsedExtInstance,
    parent_stmt: Stmt,
    parent: ExtParent,
) -> Result<ExtensionInstance, Diagnostic> {
    path.push_stmt("extension", &parsed.name);
    let result = compile_instance_at(ctx, plugins, module, path, siblings, parsed, parent_stmt, parent);
    path.pop();
    result
}

#[allow(clippy::too_many_arguments)]
fn compile_instance_at(
    ctx: &Context,
    plugins: &PluginRegistry,
    module: ModuleId,
    path: &mut SchemaPath,
    siblings: &[ExtensionInstance],
    parsed: &ParsedExtInstance,
    parent_stmt: Stmt,
    parent: ExtParent,
) -> Result<ExtensionInstance, Diagnostic> {
    let not_found = || {
        Diagnostic::error(
            ErrorCode::ExtensionNotFound,
            format!(
                "Extension definition of extension instance \"{}\" not found.",
                parsed.name
            ),
        )
        .with_path(path.render())
    };

    let (prefix, name) = split_qname(&parsed.name);
    let owner = ctx.module(module).ok_or_else(not_found)?;
    let def_module = match prefix {
        Some(prefix) => owner.resolve_prefix(prefix),
        None => Some(owner.id()),
    }
    .and_then(|id| ctx.module(id))
    .ok_or_else(not_found)?;
    let def_id = def_module.find_extension(name).ok_or_else(not_found)?;
    let def = &def_module.extensions[def_id.index as usize];

    if let (Some(arg_name), None) = (&def.argument, &parsed.argument) {
        return Err(Diagnostic::error(
            ErrorCode::MissingArgument,
            format!(
                "Extension instance \"{}\" misses argument \"{}\".",
                parsed.name, arg_name
            ),
        )
        .with_path(path.render()));
    }

    let mut ext = ExtensionInstance::new(def_id, ctx.intern(&parsed.name), parent_stmt, parent);
    ext.argument = parsed.argument.as_deref().map(|arg| ctx.intern(arg));

    let Some(plugin) = plugins.find_extension(
        &def_module.name,
        def_module.revision.as_deref(),
        name,
    ) else {
        // Extensions without a plugin only keep their nested instances.
        let mut cctx = ExtCompileCtx {
            ctx,
            plugins,
            module,
            path,
            siblings,
        };
        cctx.compile_substatements(parsed, &mut ext)?;
        return Ok(ext);
    };

    if let Some(ref argument) = parsed.argument {
        path.push_node(argument);
    }
    let result = {
        let mut cctx = ExtCompileCtx {
            ctx,
            plugins,
            module,
            path: &mut *path,
            siblings,
        };
        plugin
            .parse(parsed)
            .and_then(|()| plugin.compile(&mut cctx, parsed, &mut ext))
    };
    let result = result.map_err(|diag| {
        // Nested instances report their own plugin.
        let diag = if diag.plugin.is_none() {
            diag.with_plugin(plugin.id())
        } else {
            diag
        };
        diag.with_path(path.render())
    });
    if parsed.argument.is_some() {
        path.pop();
    }

    match result {
        Ok(()) => {
            ext.plugin = Some(plugin.id());
            Ok(ext)
        }
        Err(diag) => {
            plugin.free(ctx, &mut ext);
            Err(diag)
        }
    }
}

/// Hands compiled instances to their plugins' `free` and drops them.
pub fn free_extension_instances(
    ctx: &Context,
    plugins: &PluginRegistry,
    exts: &mut Vec<ExtensionInstance>,
) {
    for mut ext in exts.drain(..) {
        free_extension_instances(ctx, plugins, &mut ext.substmts);
        if let Some(plugin) = ext.plugin.and_then(|id| plugins.extension_by_id(id)) {
            plugin.free(ctx, &mut ext);
        }
    }
}
