//! Built-in `identityref` type plugin.
//!
//! The canonical form of an identityref value is `<module-name>:<identity-name>`,
//! which is also its JSON and LYB form.

use std::borrow::Cow;

use tracing::{trace, warn};
use yangplug_schema::{
    BaseType, CompiledType, Context, Diagnostic, ErrorCode, IdentityId, PendingImplement,
    PrefixData, SchemaNode, Status, StoreOptions, StoredValue, TypeRef, ValueFormat,
    ValuePayload,
};

use crate::types::{value_text, StoreRequest, Stored, TypePlugin, TypeRecord};

/// Identifying string of the plugin.
pub const PLUGIN_ID: &str = "yangplug - identityref, version 1";

/// The identityref type plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identityref;

/// Registration records of the plugin.
pub fn records() -> Vec<TypeRecord> {
    vec![TypeRecord {
        module: "",
        revision: None,
        name: BaseType::Identityref.name(),
        plugin: Box::new(Identityref),
    }]
}

impl Identityref {
    /// Checks that the identity may be used: its module is implemented, or
    /// implementation was requested, and no if-feature disables it.
    fn check_ident(
        ctx: &Context,
        ident: IdentityId,
        value: &str,
        options: StoreOptions,
    ) -> Result<Option<PendingImplement>, Diagnostic> {
        let module = ctx.module(ident.module).ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::DanglingHandle,
                format!("Module handle {} is not loaded.", ident.module.index()),
            )
        })?;

        if !module.implemented {
            if options.contains(StoreOptions::IMPLEMENT) {
                warn!(module = %module.name, value, "identityref value requires module implementation");
                return Ok(Some(PendingImplement(ident.module)));
            }
            return Err(Diagnostic::error(
                ErrorCode::IdentityInNonImplementedModule,
                format!(
                    "Invalid identityref \"{}\" value - identity found in non-implemented module \"{}\".",
                    value, module.name
                ),
            ));
        }
        if !ctx.identity_enabled(ident) {
            return Err(Diagnostic::error(
                ErrorCode::IdentityDisabledByFeature,
                format!(
                    "Invalid identityref \"{}\" value - identity is disabled by if-feature.",
                    value
                ),
            ));
        }
        Ok(None)
    }
}

/// Checks that a definition does not reference a value of weaker status.
///
/// Only schema values referencing their own module are checked.
pub fn check_status(
    node: &SchemaNode,
    value_status: Status,
    format: ValueFormat,
    prefix_data: &PrefixData<'_>,
    value_name: &str,
) -> Result<(), Diagnostic> {
    let PrefixData::Schema(module) = prefix_data else {
        return Ok(());
    };
    if format != ValueFormat::Schema || *module != node.module {
        return Ok(());
    }

    if node.status < value_status {
        return Err(Diagnostic::error(
            ErrorCode::StatusViolation,
            format!(
                "A {} definition \"{}\" is not allowed to reference {} value \"{}\".",
                node.status, node.name, value_status, value_name
            ),
        ));
    }
    Ok(())
}

impl TypePlugin for Identityref {
    fn id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn store(&self, ctx: &Context, ty: &TypeRef, request: StoreRequest<'_, '_>) -> Result<Stored, Diagnostic> {
        let CompiledType::Identityref(ref ident_type) = **ty else {
            return Err(Diagnostic::error(
                ErrorCode::MissingTypePlugin,
                format!("Type \"{}\" cannot be stored as identityref.", ty.basetype()),
            ));
        };

        let StoreRequest {
            value,
            options,
            format,
            prefix_data,
            hints,
            ctx_node,
        } = request;

        let value = value_text(value, hints, BaseType::Identityref)?;
        let ident = ctx.find_identity(&value, format, &prefix_data)?;
        let pending = Self::check_ident(ctx, ident, &value, options)?;
        ctx.check_bases(ident_type.bases(), ident, &value)?;

        let identity = ctx.identity_checked(ident)?;
        if let Some(node) = ctx_node {
            check_status(node, identity.status, format, &prefix_data, &identity.name)?;
        }

        let canonical = if format == ValueFormat::Canonical {
            match value {
                Cow::Owned(text) if options.contains(StoreOptions::DYNAMIC) => {
                    ctx.dict().insert_owned(text)
                }
                other => ctx.dict().insert(&other),
            }
        } else {
            let module = ctx.module(ident.module).ok_or_else(|| {
                Diagnostic::error(
                    ErrorCode::DanglingHandle,
                    format!("Module handle {} is not loaded.", ident.module.index()),
                )
            })?;
            ctx.dict()
                .insert_owned(format!("{}:{}", module.name, identity.name))
        };

        trace!(canonical = %canonical, ?format, "stored identityref value");
        Ok(Stored {
            value: StoredValue {
                realtype: TypeRef::clone(ty),
                canonical,
                payload: ValuePayload::Identity(ident),
            },
            pending,
        })
    }

    fn compare(&self, a: &StoredValue, b: &StoredValue) -> bool {
        if !a.same_type(b) {
            return false;
        }
        a.identity().is_some() && a.identity() == b.identity()
    }

    fn print<'v>(
        &self,
        ctx: &Context,
        value: &'v StoredValue,
        format: ValueFormat,
        prefix_data: &PrefixData<'_>,
    ) -> Result<Cow<'v, str>, Diagnostic> {
        if format.prints_canonical() {
            return Ok(Cow::Borrowed(value.canonical.as_str()));
        }

        let ident = value.identity().ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::DanglingHandle,
                format!("Value \"{}\" carries no identity.", value.canonical),
            )
        })?;
        let identity = ctx.identity_checked(ident)?;
        let prefix = prefix_data.prefix_of(ctx, format, ident.module).ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::PrefixUnresolved,
                format!(
                    "Invalid identityref \"{}\" value - unable to map module to a prefix.",
                    value.canonical
                ),
            )
        })?;
        if prefix.is_empty() {
            return Ok(Cow::Owned(identity.name.to_string()));
        }
        Ok(Cow::Owned(format!("{}:{}", prefix, identity.name)))
    }
}

#[cfg(test)]
mod tests;
