//! Module compiler.
//!
//! Turns a [`ParsedModule`] into a [`Module`] of the context: imports,
//! features, identities with their bases, leaf types, and extension instances,
//! which are compiled through the registered extension plugins. A failure
//! removes the half-built module from the context and logs the diagnostic.

use std::sync::Arc;

use tracing::debug;
use yangplug_schema::parsed::{is_valid_identifier, is_valid_revision, IfFeatureExpr, ParsedExtInstance, ParsedLeaf, ParsedModule};
use yangplug_schema::{
    split_qname, BaseType, CompiledType, Context, Diagnostic, ErrorCode, ExtParent,
    ExtensionDef, ExtensionInstance, Feature, FeatureId, IdentityId, IdentityrefType, IfFeature, Import,
    Module, ModuleId, NodeId, PrefixData, SchemaNode, SchemaPath, Stmt, TypeRef, ValueFormat,
};
use yangplug_schema::ident::Identity;

use crate::exts::{compile_extension_instance, free_extension_instances};
use crate::registry::PluginRegistry;

/// Compiles a parsed module into `ctx`.
///
/// With `implement` set, or with the context option `all_implemented`, the
/// module is implemented once compiled.
pub fn compile_module(
    ctx: &mut Context,
    plugins: &PluginRegistry,
    parsed: &ParsedModule,
    implement: bool,
) -> Result<ModuleId, Diagnostic> {
    let result = compile_into(ctx, plugins, parsed, implement);
    if let Err(ref diag) = result {
        ctx.log(diag.clone());
    }
    result
}

fn compile_into(
    ctx: &mut Context,
    plugins: &PluginRegistry,
    parsed: &ParsedModule,
    implement: bool,
) -> Result<ModuleId, Diagnostic> {
    let mut path = SchemaPath::new(&parsed.name);

    let module = new_module(ctx, parsed).map_err(|diag| diag.with_path(path.render()))?;
    let id = ctx.add_module(module).map_err(|diag| diag.with_path(path.render()))?;

    match compile_body(ctx, plugins, parsed, id, &mut path) {
        Ok(()) => {
            let all_implemented = ctx.options().all_implemented;
            if implement || all_implemented {
                ctx.set_implemented(id);
            }
            if all_implemented {
                let imports: Vec<ModuleId> = ctx
                    .module(id)
                    .map(|m| m.imports.iter().map(|import| import.module).collect())
                    .unwrap_or_default();
                for import in imports {
                    ctx.set_implemented(import);
                }
            }
            debug!(
                module = %parsed.name,
                implemented = ctx.module(id).is_some_and(|m| m.implemented),
                "module compiled"
            );
            Ok(id)
        }
        Err(diag) => {
            discard(ctx, plugins, id);
            Err(diag)
        }
    }
}

/// Frees the extension instances of a module that failed to compile and
/// removes it.
fn discard(ctx: &mut Context, plugins: &PluginRegistry, id: ModuleId) {
    let Some(module) = ctx.module_mut(id) else {
        return;
    };
    let mut exts = std::mem::take(&mut module.exts);
    for identity in &mut module.identities {
        exts.append(&mut identity.exts);
    }
    for feature in &mut module.features {
        exts.append(&mut feature.exts);
    }
    for node in &mut module.nodes {
        exts.append(&mut node.exts);
    }
    free_extension_instances(ctx, plugins, &mut exts);
    ctx.discard_module(id);
    debug!(module = id.index(), "module discarded");
}

/// Checks names and resolves imports.
fn new_module(ctx: &Context, parsed: &ParsedModule) -> Result<Module, Diagnostic> {
    check_identifier(&parsed.name, "module")?;
    check_identifier(&parsed.prefix, "prefix")?;
    if let Some(ref revision) = parsed.revision {
        check_revision(revision)?;
    }

    let mut module = Module::new(
        ctx.intern(&parsed.name),
        ctx.intern(&parsed.namespace),
        ctx.intern(&parsed.prefix),
    );
    module.revision = parsed.revision.as_deref().map(|r| ctx.intern(r));

    for import in &parsed.imports {
        check_identifier(&import.prefix, "prefix")?;
        if let Some(ref revision) = import.revision {
            check_revision(revision)?;
        }
        let target = ctx
            .get_module(&import.module, import.revision.as_deref())
            .ok_or_else(|| {
                Diagnostic::error(
                    ErrorCode::ImportFailed,
                    format!(
                        "Importing \"{}\" module into \"{}\" failed.",
                        import.module, parsed.name
                    ),
                )
            })?;
        module.imports.push(Import {
            prefix: ctx.intern(&import.prefix),
            module: target,
        });
    }

    for def in &parsed.extensions {
        let mut path = SchemaPath::new(&parsed.name);
        path.push_stmt("extension", &def.name);
        check_identifier(&def.name, "extension").map_err(|d| d.with_path(path.render()))?;
        if module.extensions.iter().any(|e| e.name == def.name.as_str()) {
            return Err(Diagnostic::error(
                ErrorCode::DuplicateIdentifier,
                format!("Duplicate identifier \"{}\" of extension statement.", def.name),
            )
            .with_path(path.render()));
        }
        if let Some(ref argument) = def.argument {
            check_identifier(argument, "argument").map_err(|d| d.with_path(path.render()))?;
        }
        module.extensions.push(ExtensionDef {
            name: ctx.intern(&def.name),
            argument: def.argument.as_deref().map(|arg| ctx.intern(arg)),
        });
    }
    Ok(module)
}

fn check_identifier(name: &str, keyword: &str) -> Result<(), Diagnostic> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Diagnostic::error(
            ErrorCode::InvalidIdentifier,
            format!("Invalid identifier \"{}\" of {} statement.", name, keyword),
        ))
    }
}

fn check_revision(revision: &str) -> Result<(), Diagnostic> {
    if is_valid_revision(revision) {
        Ok(())
    } else {
        Err(Diagnostic::error(
            ErrorCode::InvalidRevision,
            format!("Invalid value \"{}\" of \"revision\".", revision),
        ))
    }
}

fn module_mut(ctx: &mut Context, id: ModuleId) -> Result<&mut Module, Diagnostic> {
    ctx.module_mut(id).ok_or_else(|| {
        Diagnostic::error(
            ErrorCode::DanglingHandle,
            format!("Module handle {} is not loaded.", id.index()),
        )
    })
}

fn compile_body(
    ctx: &mut Context,
    plugins: &PluginRegistry,
    parsed: &ParsedModule,
    id: ModuleId,
    path: &mut SchemaPath,
) -> Result<(), Diagnostic> {
    compile_features(ctx, parsed, id, path)?;
    compile_identities(ctx, parsed, id, path)?;
    compile_leaves(ctx, parsed, id, path)?;
    compile_extensions(ctx, plugins, parsed, id, path)?;
    validate_extensions(ctx, plugins, id, path)
}

fn compile_features(
    ctx: &mut Context,
    parsed: &ParsedModule,
    id: ModuleId,
    path: &mut SchemaPath,
) -> Result<(), Diagnostic> {
    let mut features = Vec::with_capacity(parsed.features.len());
    for feature in &parsed.features {
        path.push_stmt("feature", &feature.name);
        check_identifier(&feature.name, "feature").map_err(|d| d.with_path(path.render()))?;
        if features.iter().any(|f: &Feature| f.name == feature.name.as_str()) {
            return Err(Diagnostic::error(
                ErrorCode::DuplicateIdentifier,
                format!("Duplicate identifier \"{}\" of feature statement.", feature.name),
            )
            .with_path(path.render()));
        }
        features.push(Feature {
            name: ctx.intern(&feature.name),
            enabled: ctx.options().feature_enabled(&parsed.name, &feature.name),
            exts: Vec::new(),
        });
        path.pop();
    }
    module_mut(ctx, id)?.features = features;

    // if-features of features may only reference declared features, and a
    // feature whose condition fails is disabled regardless of the options.
    let mut conditions = Vec::new();
    for (index, feature) in parsed.features.iter().enumerate() {
        if feature.if_features.is_empty() {
            continue;
        }
        path.push_stmt("feature", &feature.name);
        let exprs = feature
            .if_features
            .iter()
            .map(|expr| compile_if_feature(ctx, id, expr))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|d| d.with_path(path.render()))?;
        path.pop();
        conditions.push((index, exprs));
    }

    // Disabling one feature can fail the condition of another declared
    // before it. Repeat until nothing changes; features only go from enabled
    // to disabled here.
    loop {
        let failed: Vec<usize> = conditions
            .iter()
            .filter(|(index, exprs)| {
                ctx.module(id).is_some_and(|m| m.features[*index].enabled)
                    && !exprs.iter().all(|expr| expr.eval(ctx))
            })
            .map(|(index, _)| *index)
            .collect();
        if failed.is_empty() {
            break;
        }
        let module = module_mut(ctx, id)?;
        for index in failed {
            module.features[index].enabled = false;
        }
    }
    Ok(())
}

fn compile_if_feature(ctx: &Context, id: ModuleId, expr: &IfFeatureExpr) -> Result<IfFeature, Diagnostic> {
    Ok(match expr {
        IfFeatureExpr::Feature(name) => IfFeature::Feature(resolve_feature(ctx, id, name)?),
        IfFeatureExpr::Not(inner) => IfFeature::Not(Box::new(compile_if_feature(ctx, id, inner)?)),
        IfFeatureExpr::And(left, right) => IfFeature::And(
            Box::new(compile_if_feature(ctx, id, left)?),
            Box::new(compile_if_feature(ctx, id, right)?),
        ),
        IfFeatureExpr::Or(left, right) => IfFeature::Or(
            Box::new(compile_if_feature(ctx, id, left)?),
            Box::new(compile_if_feature(ctx, id, right)?),
        ),
    })
}

fn resolve_feature(ctx: &Context, id: ModuleId, qname: &str) -> Result<FeatureId, Diagnostic> {
    let (prefix, name) = split_qname(qname);
    let owner = ctx.module(id);
    let target = match prefix {
        Some(prefix) => owner.and_then(|m| m.resolve_prefix(prefix)),
        None => Some(id),
    };
    target
        .and_then(|t| ctx.module(t))
        .and_then(|m| m.find_feature(name))
        .ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::FeatureNotFound,
                format!(
                    "Invalid value \"{}\" of if-feature - unable to find feature \"{}\".",
                    qname, name
                ),
            )
        })
}

fn compile_identities(
    ctx: &mut Context,
    parsed: &ParsedModule,
    id: ModuleId,
    path: &mut SchemaPath,
) -> Result<(), Diagnostic> {
    // First pass: create every identity so bases may reference later ones.
    let mut identities: Vec<Identity> = Vec::with_capacity(parsed.identities.len());
    for identity in &parsed.identities {
        path.push_stmt("identity", &identity.name);
        check_identifier(&identity.name, "identity").map_err(|d| d.with_path(path.render()))?;
        if identities.iter().any(|i| i.name == identity.name.as_str()) {
            return Err(Diagnostic::error(
                ErrorCode::DuplicateIdentifier,
                format!("Duplicate identifier \"{}\" of identity statement.", identity.name),
            )
            .with_path(path.render()));
        }
        identities.push(Identity {
            name: ctx.intern(&identity.name),
            module: id,
            bases: Vec::new(),
            status: identity.status,
            if_features: Vec::new(),
            exts: Vec::new(),
        });
        path.pop();
    }
    module_mut(ctx, id)?.identities = identities;

    // Second pass: bases and if-features.
    let mut resolved = Vec::with_capacity(parsed.identities.len());
    for identity in &parsed.identities {
        path.push_stmt("identity", &identity.name);
        let mut bases = Vec::with_capacity(identity.bases.len());
        for base in &identity.bases {
            let base_id = ctx
                .find_identity(base, ValueFormat::Schema, &PrefixData::Schema(id))
                .map_err(|_| {
                    Diagnostic::error(
                        ErrorCode::UnresolvedBase,
                        format!(
                            "Unable to find base ({}) of identity \"{}\".",
                            base, identity.name
                        ),
                    )
                    .with_path(path.render())
                })?;
            bases.push(base_id);
        }
        let if_features = identity
            .if_features
            .iter()
            .map(|expr| compile_if_feature(ctx, id, expr))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|d| d.with_path(path.render()))?;
        resolved.push((bases, if_features));
        path.pop();
    }
    let module = module_mut(ctx, id)?;
    for (identity, (bases, if_features)) in module.identities.iter_mut().zip(resolved) {
        identity.bases = bases;
        identity.if_features = if_features;
    }

    for (index, identity) in parsed.identities.iter().enumerate() {
        let ident = IdentityId {
            module: id,
            index: index as u32,
        };
        let direct = ctx
            .identity(ident)
            .is_some_and(|i| i.bases.contains(&ident));
        if direct || ctx.derives_from_itself(ident) {
            path.push_stmt("identity", &identity.name);
            let message = if direct {
                format!("Identity \"{}\" is derived from itself.", identity.name)
            } else {
                format!("Identity \"{}\" is indirectly derived from itself.", identity.name)
            };
            return Err(Diagnostic::error(ErrorCode::DerivationCycle, message).with_path(path.render()));
        }
    }
    Ok(())
}

fn compile_leaves(
    ctx: &mut Context,
    parsed: &ParsedModule,
    id: ModuleId,
    path: &mut SchemaPath,
) -> Result<(), Diagnostic> {
    let mut nodes: Vec<SchemaNode> = Vec::with_capacity(parsed.leaves.len());
    for leaf in &parsed.leaves {
        path.push_node(&leaf.name);
        check_identifier(&leaf.name, "leaf").map_err(|d| d.with_path(path.render()))?;
        if nodes.iter().any(|n| n.name == leaf.name.as_str()) {
            return Err(Diagnostic::error(
                ErrorCode::DuplicateIdentifier,
                format!("Duplicate identifier \"{}\" of data definition statement.", leaf.name),
            )
            .with_path(path.render()));
        }
        let ty = compile_type(ctx, id, leaf).map_err(|d| d.with_path(path.render()))?;
        nodes.push(SchemaNode {
            keyword: Stmt::Leaf,
            name: ctx.intern(&leaf.name),
            module: id,
            status: leaf.status,
            ty,
            exts: Vec::new(),
        });
        path.pop();
    }
    module_mut(ctx, id)?.nodes = nodes;
    Ok(())
}

/// Compiles the type of a leaf.
pub fn compile_type(ctx: &Context, id: ModuleId, leaf: &ParsedLeaf) -> Result<TypeRef, Diagnostic> {
    let basetype = BaseType::from_name(&leaf.type_name).ok_or_else(|| {
        Diagnostic::error(
            ErrorCode::UnknownType,
            format!("Referenced type \"{}\" not found.", leaf.type_name),
        )
    })?;
    if basetype != BaseType::Identityref {
        return Ok(Arc::new(CompiledType::Other(basetype)));
    }

    let mut bases = Vec::with_capacity(leaf.bases.len());
    for base in &leaf.bases {
        let base_id = ctx
            .find_identity(base, ValueFormat::Schema, &PrefixData::Schema(id))
            .map_err(|_| {
                Diagnostic::error(
                    ErrorCode::UnresolvedBase,
                    format!("Unable to find base ({}) of identityref.", base),
                )
            })?;
        bases.push(base_id);
    }
    let ty = IdentityrefType::new(bases).ok_or_else(|| {
        Diagnostic::error(
            ErrorCode::MissingBase,
            "Missing base substatement for identityref type.",
        )
    })?;
    Ok(Arc::new(CompiledType::Identityref(ty)))
}

/// Compiles the extension instances of one parent into a new list.
fn compile_ext_list(
    ctx: &Context,
    plugins: &PluginRegistry,
    id: ModuleId,
    path: &mut SchemaPath,
    parsed: &[ParsedExtInstance],
    parent_stmt: Stmt,
    parent: ExtParent,
) -> Result<Vec<ExtensionInstance>, Diagnostic> {
    let mut compiled = Vec::with_capacity(parsed.len());
    for ext in parsed {
        match compile_extension_instance(ctx, plugins, id, path, &compiled, ext, parent_stmt, parent) {
            Ok(instance) => compiled.push(instance),
            Err(diag) => {
                free_extension_instances(ctx, plugins, &mut compiled);
                return Err(diag);
            }
        }
    }
    Ok(compiled)
}

fn compile_extensions(
    ctx: &mut Context,
    plugins: &PluginRegistry,
    parsed: &ParsedModule,
    id: ModuleId,
    path: &mut SchemaPath,
) -> Result<(), Diagnostic> {
    let exts = compile_ext_list(ctx, plugins, id, path, &parsed.exts, Stmt::Module, ExtParent::Module(id))?;
    module_mut(ctx, id)?.exts = exts;

    for (index, feature) in parsed.features.iter().enumerate() {
        if feature.exts.is_empty() {
            continue;
        }
        let parent = ExtParent::Feature(FeatureId {
            module: id,
            index: index as u32,
        });
        path.push_stmt("feature", &feature.name);
        let exts = compile_ext_list(ctx, plugins, id, path, &feature.exts, Stmt::Feature, parent)?;
        path.pop();
        module_mut(ctx, id)?.features[index].exts = exts;
    }

    for (index, identity) in parsed.identities.iter().enumerate() {
        if identity.exts.is_empty() {
            continue;
        }
        let parent = ExtParent::Identity(IdentityId {
            module: id,
            index: index as u32,
        });
        path.push_stmt("identity", &identity.name);
        let exts = compile_ext_list(ctx, plugins, id, path, &identity.exts, Stmt::Identity, parent)?;
        path.pop();
        module_mut(ctx, id)?.identities[index].exts = exts;
    }

    for (index, leaf) in parsed.leaves.iter().enumerate() {
        if leaf.exts.is_empty() {
            continue;
        }
        let parent = ExtParent::Node(NodeId {
            module: id,
            index: index as u32,
        });
        path.push_node(&leaf.name);
        let exts = compile_ext_list(ctx, plugins, id, path, &leaf.exts, Stmt::Leaf, parent)?;
        path.pop();
        module_mut(ctx, id)?.nodes[index].exts = exts;
    }
    Ok(())
}

fn validate_extensions(
    ctx: &Context,
    plugins: &PluginRegistry,
    id: ModuleId,
    path: &SchemaPath,
) -> Result<(), Diagnostic> {
    let Some(module) = ctx.module(id) else {
        return Ok(());
    };
    let all = module
        .exts
        .iter()
        .chain(module.features.iter().flat_map(|f| f.exts.iter()))
        .chain(module.identities.iter().flat_map(|i| i.exts.iter()))
        .chain(module.nodes.iter().flat_map(|n| n.exts.iter()));
    for ext in all {
        let Some(plugin) = ext.plugin.and_then(|plugin_id| plugins.extension_by_id(plugin_id)) else {
            continue;
        };
        plugin
            .validate(ctx, ext)
            .map_err(|d| d.with_plugin(plugin.id()).with_path(path.render()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests;
