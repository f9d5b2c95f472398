//! Context configuration and per-call option sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Feature name that enables every feature of a module.
pub const ALL_FEATURES: &str = "*";

/// Options a context is created with.
///
/// ```
/// use yangplug_schema::ContextOptions;
///
/// let options = ContextOptions::from_json(
///     r#"{"ref_implemented": true, "features": {"a": ["fast"]}}"#,
/// )
/// .unwrap();
/// assert!(options.ref_implemented);
/// assert!(options.feature_enabled("a", "fast"));
/// assert!(!options.feature_enabled("a", "slow"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextOptions {
    /// Implement every module as soon as it is imported.
    pub all_implemented: bool,
    /// Let stored data values implicitly implement the module owning them.
    pub ref_implemented: bool,
    /// Enabled features per module name.
    pub features: BTreeMap<String, Vec<String>>,
}

impl ContextOptions {
    /// Parses options from their JSON form.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(SchemaError::Options)
    }

    /// Enables one feature of a module.
    pub fn enable_feature(mut self, module: impl Into<String>, feature: impl Into<String>) -> Self {
        self.features
            .entry(module.into())
            .or_default()
            .push(feature.into());
        self
    }

    /// Returns true if `feature` of `module` is enabled.
    pub fn feature_enabled(&self, module: &str, feature: &str) -> bool {
        self.features
            .get(module)
            .is_some_and(|names| names.iter().any(|n| n == feature || n == ALL_FEATURES))
    }

    /// Store options every data value stored in this context starts from.
    pub fn store_options(&self) -> StoreOptions {
        if self.ref_implemented {
            StoreOptions::IMPLEMENT
        } else {
            StoreOptions::empty()
        }
    }
}

bitflags::bitflags! {
    /// Options of a single type-plugin store call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StoreOptions: u32 {
        /// Request implementation of the module owning the value if it is not implemented.
        const IMPLEMENT = 1 << 0;
        /// The value bytes are handed over to the plugin.
        const DYNAMIC = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Encoding hints a data parser attaches to a raw value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ValueHints: u32 {
        /// The value was encoded as a string.
        const STRING = 1 << 0;
        /// Decimal number.
        const DECNUM = 1 << 1;
        /// Octal number.
        const OCTNUM = 1 << 2;
        /// Hexadecimal number.
        const HEXNUM = 1 << 3;
        /// 64-bit number encoded as a string.
        const NUM64 = 1 << 4;
        /// Boolean literal.
        const BOOLEAN = 1 << 5;
        /// Empty value.
        const EMPTY = 1 << 6;
    }
}

impl ValueHints {
    /// Hints of a format that carries no encoding information, so any type may match.
    pub const DATA: ValueHints = ValueHints::all();
}
