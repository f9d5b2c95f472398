//! Identity registry: lookup, derivation and base checks.
//!
//! Identities are owned by their module's identity table. Every other place
//! refers to them through an [`IdentityId`] handle that is resolved against the
//! context on use.

use std::collections::HashSet;

use crate::context::Context;
use crate::dict::DictStr;
use crate::error::{Diagnostic, ErrorCode};
use crate::ext::ExtensionInstance;
use crate::format::{split_qname, PrefixData, ValueFormat};
use crate::module::{FeatureId, ModuleId, Status};

/// Handle of an identity: owning module and position in its identity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityId {
    /// Owning module.
    pub module: ModuleId,
    /// Position in the module's identity table.
    pub index: u32,
}

/// A compiled `identity`.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Identity name, unique within its module.
    pub name: DictStr,
    /// Owning module.
    pub module: ModuleId,
    /// Identities this one is directly derived from.
    pub bases: Vec<IdentityId>,
    /// Status of the definition.
    pub status: Status,
    /// Compiled if-feature expressions, all of which must hold.
    pub if_features: Vec<IfFeature>,
    /// Extension instances placed on the identity.
    pub exts: Vec<ExtensionInstance>,
}

/// A compiled if-feature expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfFeature {
    /// A single feature.
    Feature(FeatureId),
    /// Negation.
    Not(Box<IfFeature>),
    /// Both operands hold.
    And(Box<IfFeature>, Box<IfFeature>),
    /// Either operand holds.
    Or(Box<IfFeature>, Box<IfFeature>),
}

impl IfFeature {
    /// Evaluates the expression against the current feature states.
    pub fn eval(&self, ctx: &Context) -> bool {
        match self {
            IfFeature::Feature(id) => ctx
                .module(id.module)
                .and_then(|module| module.features.get(id.index as usize))
                .is_some_and(|feature| feature.enabled),
            IfFeature::Not(expr) => !expr.eval(ctx),
            IfFeature::And(left, right) => left.eval(ctx) && right.eval(ctx),
            IfFeature::Or(left, right) => left.eval(ctx) || right.eval(ctx),
        }
    }
}

impl Context {
    /// Resolves an identity handle.
    pub fn identity(&self, id: IdentityId) -> Option<&Identity> {
        self.module(id.module)?.identities.get(id.index as usize)
    }

    /// Resolves an identity handle, reporting a dangling handle as an invariant failure.
    pub fn identity_checked(&self, id: IdentityId) -> Result<&Identity, Diagnostic> {
        self.identity(id).ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::DanglingHandle,
                format!(
                    "Identity handle ({}, {}) does not refer to an identity of this context.",
                    id.module.index(),
                    id.index
                ),
            )
        })
    }

    /// Returns `<module-name>:<identity-name>`.
    pub fn identity_qname(&self, id: IdentityId) -> Option<String> {
        let ident = self.identity(id)?;
        let module = self.module(ident.module)?;
        Some(format!("{}:{}", module.name, ident.name))
    }

    /// Finds the identity a qualified name refers to in the given value format.
    ///
    /// The name is split at the first `:`. The prefix, or the format's default
    /// module when there is none, is resolved through `prefix_data`.
    pub fn find_identity(
        &self,
        value: &str,
        format: ValueFormat,
        prefix_data: &PrefixData<'_>,
    ) -> Result<IdentityId, Diagnostic> {
        let (prefix, name) = split_qname(value);

        let module_id = prefix_data
            .resolve(self, format, prefix)
            .ok_or_else(|| {
                Diagnostic::error(
                    ErrorCode::PrefixUnresolved,
                    format!(
                        "Invalid identityref \"{}\" value - unable to map prefix to YANG schema.",
                        value
                    ),
                )
            })?;
        let module = self.module(module_id).ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::DanglingHandle,
                format!("Module handle {} is not loaded.", module_id.index()),
            )
        })?;

        module.find_identity(name).ok_or_else(|| {
            Diagnostic::error(
                ErrorCode::IdentityNotFound,
                format!(
                    "Invalid identityref \"{}\" value - identity not found in module \"{}\".",
                    value, module.name
                ),
            )
        })
    }

    /// Returns true if `ident` is `base` or is transitively derived from it.
    pub fn is_derived(&self, base: IdentityId, ident: IdentityId) -> bool {
        let mut stack = vec![ident];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == base {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(identity) = self.identity(current) {
                stack.extend(identity.bases.iter().copied());
            }
        }
        false
    }

    /// Returns true if one of the identity's bases is derived from the identity itself.
    pub fn derives_from_itself(&self, ident: IdentityId) -> bool {
        self.identity(ident).is_some_and(|identity| {
            identity
                .bases
                .iter()
                .any(|&base| self.is_derived(ident, base))
        })
    }

    /// Checks that `ident` is derived from every identity in `bases`.
    ///
    /// `value` is the literal the identity was resolved from and only appears in
    /// the diagnostic.
    pub fn check_bases(
        &self,
        bases: &[IdentityId],
        ident: IdentityId,
        value: &str,
    ) -> Result<(), Diagnostic> {
        if bases.iter().all(|&base| self.is_derived(base, ident)) {
            return Ok(());
        }

        let names = bases
            .iter()
            .map(|&base| {
                format!(
                    "\"{}\"",
                    self.identity_qname(base).unwrap_or_else(|| String::from("?"))
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let message = if bases.len() == 1 {
            format!(
                "Invalid identityref \"{}\" value - identity not derived from the base {}.",
                value, names
            )
        } else {
            format!(
                "Invalid identityref \"{}\" value - identity not derived from all the bases {}.",
                value, names
            )
        };
        Err(Diagnostic::error(ErrorCode::NotDerived, message))
    }

    /// Returns true unless one of the identity's if-feature expressions is false.
    pub fn identity_enabled(&self, ident: IdentityId) -> bool {
        self.identity(ident)
            .is_some_and(|identity| identity.if_features.iter().all(|expr| expr.eval(self)))
    }
}
