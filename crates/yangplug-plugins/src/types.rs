//! Type plugin contract.
//!
//! A type plugin turns raw value bytes into a [`StoredValue`] and back. The
//! data entry points look the plugin up by the value's base type and drive it
//! through [`TypePlugin::store`], [`TypePlugin::print`] and friends.

use std::borrow::Cow;
use std::cmp::Ordering;

use yangplug_schema::{
    BaseType, Context, Diagnostic, ErrorCode, PendingImplement, PrefixData, SchemaNode,
    StoreOptions, StoredValue, TypeRef, ValueFormat, ValueHints,
};

/// Input of one store call.
#[derive(Debug, Clone)]
pub struct StoreRequest<'a, 'v> {
    /// Raw value bytes. `Cow::Owned` bytes are handed over to the plugin.
    pub value: Cow<'v, [u8]>,
    /// Store options.
    pub options: StoreOptions,
    /// Format the value is encoded in.
    pub format: ValueFormat,
    /// Prefix resolution data of `format`.
    pub prefix_data: PrefixData<'a>,
    /// Encoding hints of the data parser, empty if none were supplied.
    pub hints: ValueHints,
    /// Schema node the value belongs to, if any.
    pub ctx_node: Option<&'a SchemaNode>,
}

impl<'a, 'v> StoreRequest<'a, 'v> {
    /// Creates a request with no options, hints or context node.
    pub fn new(value: impl Into<Cow<'v, [u8]>>, format: ValueFormat, prefix_data: PrefixData<'a>) -> Self {
        Self {
            value: value.into(),
            options: StoreOptions::empty(),
            format,
            prefix_data,
            hints: ValueHints::empty(),
            ctx_node: None,
        }
    }

    /// Sets the store options.
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the encoding hints.
    pub fn hints(mut self, hints: ValueHints) -> Self {
        self.hints = hints;
        self
    }

    /// Sets the context node.
    pub fn ctx_node(mut self, node: &'a SchemaNode) -> Self {
        self.ctx_node = Some(node);
        self
    }
}

/// Result of a successful store.
#[derive(Debug)]
pub struct Stored {
    /// The canonical value.
    pub value: StoredValue,
    /// Module implementation the store relied on, to be handed to a resolver.
    pub pending: Option<PendingImplement>,
}

/// Operations every value type provides.
pub trait TypePlugin: Send + Sync {
    /// Identifying string used in diagnostics.
    fn id(&self) -> &'static str;

    /// Resolves raw bytes into a canonical stored value.
    fn store(&self, ctx: &Context, ty: &TypeRef, request: StoreRequest<'_, '_>) -> Result<Stored, Diagnostic>;

    /// Checks a stored value against the rest of the data.
    fn validate(&self, _ctx: &Context, _value: &StoredValue) -> Result<(), Diagnostic> {
        Ok(())
    }

    /// Returns true if both values are equal.
    fn compare(&self, a: &StoredValue, b: &StoredValue) -> bool;

    /// Orders two values, if the type defines an order.
    fn sort(&self, _a: &StoredValue, _b: &StoredValue) -> Option<Ordering> {
        None
    }

    /// Prints a value. `Cow::Borrowed` is the stored canonical string,
    /// `Cow::Owned` was built for this call.
    fn print<'v>(
        &self,
        ctx: &Context,
        value: &'v StoredValue,
        format: ValueFormat,
        prefix_data: &PrefixData<'_>,
    ) -> Result<Cow<'v, str>, Diagnostic>;

    /// Copies a value.
    fn duplicate(&self, ctx: &Context, value: &StoredValue) -> StoredValue {
        dup_simple(ctx, value)
    }

    /// Releases a value.
    fn free(&self, ctx: &Context, value: StoredValue) {
        free_simple(ctx, value)
    }

    /// Fixed LYB length of the value, `None` for variable length.
    fn lyb_data_len(&self) -> Option<usize> {
        None
    }
}

/// Registration of a type plugin.
pub struct TypeRecord {
    /// Module defining the type, empty for built-in types.
    pub module: &'static str,
    /// Revision of that module, `None` for any.
    pub revision: Option<&'static str>,
    /// Type name.
    pub name: &'static str,
    /// The implementation.
    pub plugin: Box<dyn TypePlugin>,
}

impl std::fmt::Debug for TypeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRecord")
            .field("module", &self.module)
            .field("revision", &self.revision)
            .field("name", &self.name)
            .field("id", &self.plugin.id())
            .finish()
    }
}

/// Copies a value whose canonical string is the whole state.
pub fn dup_simple(ctx: &Context, value: &StoredValue) -> StoredValue {
    StoredValue {
        realtype: TypeRef::clone(&value.realtype),
        canonical: ctx.dict().insert(&value.canonical),
        payload: value.payload,
    }
}

/// Releases a value whose canonical string is the whole state.
pub fn free_simple(ctx: &Context, value: StoredValue) {
    ctx.dict().release(value.canonical);
}

fn invalid_utf8(basetype: BaseType, len: usize, valid_up_to: usize) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::MalformedHint,
        format!(
            "Invalid {} value - {} bytes are not valid UTF-8 (error at byte {}).",
            basetype, len, valid_up_to
        ),
    )
}

/// Checks raw value bytes against the encoding hints of a data parser and
/// returns them as a string.
///
/// Empty hints mean the caller supplied none and only the encoding is checked.
pub fn check_hints(value: &[u8], hints: ValueHints, basetype: BaseType) -> Result<&str, Diagnostic> {
    let text = std::str::from_utf8(value)
        .map_err(|e| invalid_utf8(basetype, value.len(), e.valid_up_to()))?;

    if !hints.is_empty() && basetype.is_string_encoded() && !hints.contains(ValueHints::STRING) {
        return Err(Diagnostic::error(
            ErrorCode::MalformedHint,
            format!("Invalid non-string-encoded {} value \"{}\".", basetype, text),
        ));
    }
    Ok(text)
}

/// Like [`check_hints`], but keeps owned bytes owned.
pub fn value_text<'v>(
    value: Cow<'v, [u8]>,
    hints: ValueHints,
    basetype: BaseType,
) -> Result<Cow<'v, str>, Diagnostic> {
    match value {
        Cow::Borrowed(bytes) => check_hints(bytes, hints, basetype).map(Cow::Borrowed),
        Cow::Owned(bytes) => {
            let text = String::from_utf8(bytes).map_err(|e| {
                invalid_utf8(basetype, e.as_bytes().len(), e.utf8_error().valid_up_to())
            })?;
            check_hints(text.as_bytes(), hints, basetype)?;
            Ok(Cow::Owned(text))
        }
    }
}
