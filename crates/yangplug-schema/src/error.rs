//! Error codes, diagnostics and context-level errors.

use thiserror::Error;

/// Broad class of a failure.
///
/// The class decides how far a failure is allowed to travel: input-shape and
/// resolution failures abort one value or one module, configuration failures
/// mean the context was set up wrongly, and invariant failures mean a
/// construction-time guarantee did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed value bytes or a wrong encoding hint.
    InputShape,
    /// A name did not resolve or resolved to something not acceptable here.
    Resolution,
    /// The context lacks a module or plugin it is expected to carry.
    Configuration,
    /// A structural invariant of the schema does not hold.
    Invariant,
}

/// Error codes for schema compilation and value storing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Value input errors (E001-E009)
    /// E001: Value bytes do not match the format hints
    MalformedHint,

    // Resolution errors (E010-E019)
    /// E010: Namespace prefix cannot be mapped in the value format
    PrefixUnresolved,
    /// E011: Prefix resolved but the module has no such identity
    IdentityNotFound,
    /// E012: Identity lives in a module that is not implemented
    IdentityInNonImplementedModule,
    /// E013: Identity is disabled by its if-feature expressions
    IdentityDisabledByFeature,
    /// E014: Identity is not derived from the required bases
    NotDerived,
    /// E015: Definition references a value with a weaker status
    StatusViolation,

    // Schema compilation errors (E020-E039)
    /// E020: Extension instance placed under a statement it does not allow
    InvalidPlacement,
    /// E021: Extension instantiated more than once on one parent
    DuplicateInstance,
    /// E022: Extension argument identity does not derive from the scheme base
    ArgumentNotDerivedFromBase,
    /// E023: Extension instance lacks its mandatory argument
    MissingArgument,
    /// E024: No extension definition matches the instance name
    ExtensionNotFound,
    /// E025: Imported module is not present in the context
    ImportFailed,
    /// E026: Same identifier declared twice in one module
    DuplicateIdentifier,
    /// E027: Base of an identity cannot be resolved
    UnresolvedBase,
    /// E028: if-feature references an unknown feature
    FeatureNotFound,
    /// E029: identityref type declares no base
    MissingBase,
    /// E030: Name is not a valid identifier
    InvalidIdentifier,
    /// E031: Revision is not a YYYY-MM-DD date
    InvalidRevision,
    /// E032: Referenced type is not known
    UnknownType,
    /// E033: Module with the same name and revision is already loaded
    DuplicateModule,

    // Configuration errors (E040-E049)
    /// E040: Module required by a plugin is missing from the context
    InternalMissingModule,
    /// E041: No type plugin handles the value's type
    MissingTypePlugin,

    // Invariant errors (E050-E059)
    /// E050: Identity derivation would form a cycle
    DerivationCycle,
    /// E051: Handle does not refer to an entry of this context
    DanglingHandle,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MalformedHint => "E001",
            ErrorCode::PrefixUnresolved => "E010",
            ErrorCode::IdentityNotFound => "E011",
            ErrorCode::IdentityInNonImplementedModule => "E012",
            ErrorCode::IdentityDisabledByFeature => "E013",
            ErrorCode::NotDerived => "E014",
            ErrorCode::StatusViolation => "E015",
            ErrorCode::InvalidPlacement => "E020",
            ErrorCode::DuplicateInstance => "E021",
            ErrorCode::ArgumentNotDerivedFromBase => "E022",
            ErrorCode::MissingArgument => "E023",
            ErrorCode::ExtensionNotFound => "E024",
            ErrorCode::ImportFailed => "E025",
            ErrorCode::DuplicateIdentifier => "E026",
            ErrorCode::UnresolvedBase => "E027",
            ErrorCode::FeatureNotFound => "E028",
            ErrorCode::MissingBase => "E029",
            ErrorCode::InvalidIdentifier => "E030",
            ErrorCode::InvalidRevision => "E031",
            ErrorCode::UnknownType => "E032",
            ErrorCode::DuplicateModule => "E033",
            ErrorCode::InternalMissingModule => "E040",
            ErrorCode::MissingTypePlugin => "E041",
            ErrorCode::DerivationCycle => "E050",
            ErrorCode::DanglingHandle => "E051",
        }
    }

    /// Returns the class this code belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorCode::MalformedHint => ErrorClass::InputShape,
            ErrorCode::InternalMissingModule | ErrorCode::MissingTypePlugin => {
                ErrorClass::Configuration
            }
            ErrorCode::DerivationCycle | ErrorCode::DanglingHandle => ErrorClass::Invariant,
            _ => ErrorClass::Resolution,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Worth reporting, the operation still succeeded.
    Warning,
    /// The operation failed.
    Error,
}

/// A structured failure record: code, message, optional context path and the
/// id of the plugin that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable message, without the plugin tag.
    pub message: String,
    /// Context path of the offending statement or data node.
    pub path: Option<String>,
    /// Id string of the plugin that reported the failure.
    pub plugin: Option<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            path: None,
            plugin: None,
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    /// Attaches a context path unless one is already set.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        if self.path.is_none() {
            self.path = Some(path.into());
        }
        self
    }

    /// Tags the diagnostic with the reporting plugin.
    pub fn with_plugin(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin = Some(plugin_id.into());
        self
    }

    /// Returns the class of the underlying code.
    pub fn class(&self) -> ErrorClass {
        self.code.class()
    }

    /// Returns true for configuration and invariant failures.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Configuration | ErrorClass::Invariant
        )
    }

    /// Returns the message with the plugin tag prepended, as it is logged.
    pub fn full_message(&self) -> String {
        match self.plugin {
            Some(ref plugin) => format!("Extension plugin \"{}\": {}", plugin, self.message),
            None => self.message.clone(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.full_message(), path)
        } else {
            write!(f, "{}: {}", self.code, self.full_message())
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Top-level error type for context operations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Context options could not be parsed.
    #[error("invalid context options: {0}")]
    Options(serde_json::Error),

    /// A parsed module document could not be read or written.
    #[error("invalid module document: {0}")]
    Module(serde_json::Error),

    /// A parsed module could not be compiled.
    #[error("{0}")]
    Compile(#[from] Diagnostic),
}
