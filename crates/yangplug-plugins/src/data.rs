//! Data value entry points.
//!
//! These stand in for the data parsers: they find the type plugin of a leaf,
//! store one raw value, and route any module implementation the plugin asked
//! for into the caller's [`Unres`].

use std::borrow::Cow;

use yangplug_schema::format::lyb;
use yangplug_schema::{
    Context, Diagnostic, ErrorCode, NodeId, PrefixData, SchemaNode, StoreOptions, StoredValue,
    Unres, ValueFormat, ValueHints,
};

use crate::registry::PluginRegistry;
use crate::types::{free_simple, StoreRequest, TypePlugin};

/// One raw value as a data parser hands it over.
#[derive(Debug, Clone)]
pub struct RawValue<'a, 'v> {
    /// Value bytes. `Cow::Owned` bytes are handed over.
    pub bytes: Cow<'v, [u8]>,
    /// Format of the bytes.
    pub format: ValueFormat,
    /// Prefix resolution data of `format`.
    pub prefix_data: PrefixData<'a>,
    /// Encoding hints.
    pub hints: ValueHints,
}

impl<'a, 'v> RawValue<'a, 'v> {
    /// A JSON string value.
    pub fn json(bytes: impl Into<Cow<'v, [u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            format: ValueFormat::Json,
            prefix_data: PrefixData::Module(None),
            hints: ValueHints::STRING,
        }
    }

    /// An XML text value with its namespace bindings.
    pub fn xml(bytes: impl Into<Cow<'v, [u8]>>, namespaces: &'a yangplug_schema::XmlNamespaces) -> Self {
        Self {
            bytes: bytes.into(),
            format: ValueFormat::Xml,
            prefix_data: PrefixData::Xml(namespaces),
            hints: ValueHints::DATA,
        }
    }

    /// A value already in canonical form.
    pub fn canonical(bytes: impl Into<Cow<'v, [u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            format: ValueFormat::Canonical,
            prefix_data: PrefixData::Module(None),
            hints: ValueHints::empty(),
        }
    }
}

/// Resolves a node handle.
pub fn schema_node(ctx: &Context, node: NodeId) -> Result<&SchemaNode, Diagnostic> {
    ctx.module(node.module)
        .and_then(|m| m.nodes.get(node.index as usize))
        .ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::DanglingHandle,
                format!(
                    "Node handle ({}, {}) does not refer to a node of this context.",
                    node.module.index(),
                    node.index
                ),
            )
        })
}

/// Finds the type plugin of a node: one registered by the node's module
/// first, then the built-in one.
pub fn type_plugin<'p>(
    ctx: &Context,
    plugins: &'p PluginRegistry,
    node: &SchemaNode,
) -> Result<&'p dyn TypePlugin, Diagnostic> {
    let name = node.ty.basetype().name();
    let module = ctx.module(node.module);
    module
        .and_then(|m| plugins.find_type(&m.name, m.revision.as_deref(), name))
        .or_else(|| plugins.find_type("", None, name))
        .ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::MissingTypePlugin,
                format!("Missing type plugin for type \"{}\".", name),
            )
        })
}

fn node_path(ctx: &Context, node: &SchemaNode) -> String {
    let module = ctx.module(node.module).map(|m| m.name.as_str()).unwrap_or("");
    format!("/{}:{}", module, node.name)
}

/// Stores one value of a leaf.
///
/// The context's store options apply, and owned bytes are handed to the
/// plugin. Failures are logged in the context with the leaf's path. The
/// returned value is released with [`free_value`].
pub fn store_value(
    ctx: &Context,
    plugins: &PluginRegistry,
    node: NodeId,
    raw: RawValue<'_, '_>,
    unres: &mut Unres,
) -> Result<StoredValue, Diagnostic> {
    let result = store_at(ctx, plugins, node, raw, unres);
    if let Err(ref diag) = result {
        ctx.log(diag.clone());
    }
    result
}

fn store_at(
    ctx: &Context,
    plugins: &PluginRegistry,
    node: NodeId,
    raw: RawValue<'_, '_>,
    unres: &mut Unres,
) -> Result<StoredValue, Diagnostic> {
    let schema = schema_node(ctx, node)?;
    let path = node_path(ctx, schema);
    let plugin = type_plugin(ctx, plugins, schema).map_err(|d| d.with_path(path.clone()))?;

    let mut options = ctx.options().store_options();
    if matches!(raw.bytes, Cow::Owned(_)) {
        options |= StoreOptions::DYNAMIC;
    }

    // JSON and LYB values default to the leaf's module.
    let prefix_data = match raw.prefix_data {
        PrefixData::Module(None) => PrefixData::Module(Some(schema.module)),
        other => other,
    };

    let request = StoreRequest {
        value: raw.bytes,
        options,
        format: raw.format,
        prefix_data,
        hints: raw.hints,
        ctx_node: Some(schema),
    };
    let stored = plugin
        .store(ctx, &schema.ty, request)
        .map_err(|d| d.with_path(path.clone()))?;

    if let Err(diag) = plugin.validate(ctx, &stored.value) {
        plugin.free(ctx, stored.value);
        return Err(diag.with_path(path));
    }
    if let Some(pending) = stored.pending {
        unres.push(pending);
    }
    Ok(stored.value)
}

/// Stores one LYB-framed value of a leaf. The input must hold exactly one frame.
pub fn store_lyb_value(
    ctx: &Context,
    plugins: &PluginRegistry,
    node: NodeId,
    input: &[u8],
    unres: &mut Unres,
) -> Result<StoredValue, Diagnostic> {
    let framed = lyb::read_value(input).and_then(|(value, rest)| {
        if rest.is_empty() {
            Ok(value)
        } else {
            Err(Diagnostic::error(
                ErrorCode::MalformedHint,
                format!("Invalid LYB value - {} trailing bytes.", rest.len()),
            ))
        }
    });
    let value = match framed {
        Ok(value) => value,
        Err(diag) => {
            let diag = match schema_node(ctx, node) {
                Ok(schema) => diag.with_path(node_path(ctx, schema)),
                Err(_) => diag,
            };
            ctx.log(diag.clone());
            return Err(diag);
        }
    };

    let raw = RawValue {
        bytes: Cow::Borrowed(value),
        format: ValueFormat::Lyb,
        prefix_data: PrefixData::Module(None),
        hints: ValueHints::empty(),
    };
    store_value(ctx, plugins, node, raw, unres)
}

/// Prints a stored value of a leaf.
pub fn print_value<'v>(
    ctx: &Context,
    plugins: &PluginRegistry,
    node: NodeId,
    value: &'v StoredValue,
    format: ValueFormat,
    prefix_data: &PrefixData<'_>,
) -> Result<Cow<'v, str>, Diagnostic> {
    let schema = schema_node(ctx, node)?;
    let plugin = type_plugin(ctx, plugins, schema)?;
    plugin.print(ctx, value, format, prefix_data)
}

/// Releases a stored value of a leaf through its type plugin.
///
/// Falls back to releasing the canonical string if the node no longer
/// resolves to a plugin.
pub fn free_value(ctx: &Context, plugins: &PluginRegistry, node: NodeId, value: StoredValue) {
    match schema_node(ctx, node).and_then(|schema| type_plugin(ctx, plugins, schema)) {
        Ok(plugin) => plugin.free(ctx, value),
        Err(_) => free_simple(ctx, value),
    }
}

/// Prints a stored value as a LYB frame.
pub fn print_lyb_value(
    ctx: &Context,
    plugins: &PluginRegistry,
    node: NodeId,
    value: &StoredValue,
) -> Result<Vec<u8>, Diagnostic> {
    let text = print_value(ctx, plugins, node, value, ValueFormat::Lyb, &PrefixData::Module(None))?;
    let mut out = Vec::new();
    lyb::write_value(text.as_bytes(), &mut out)?;
    Ok(out)
}
