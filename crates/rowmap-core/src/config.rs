//! Engine configuration
//!
//! `EngineConfig` is plain serde data so it can live in a YAML, JSON or TOML
//! file next to the rest of an application's settings. It is consumed once,
//! when a `MappingEngine` is built, and never consulted again.

use crate::mapping::FieldGroup;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do with keys that no rule or table entry covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Fail with `UnknownField`
    #[default]
    Reject,
    /// Forward the key unchanged (identity mapping)
    Passthrough,
}

/// What the reverse transform does with a partially present column group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialCompoundPolicy {
    /// Fail with `IncompleteCompound`
    #[default]
    Reject,
    /// Drop the compound key and its stray columns
    Omit,
}

/// An additional table entry supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub app_key: String,
    pub column: String,
    pub group: FieldGroup,
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Handling of unmapped keys in both directions
    pub unknown_fields: UnknownFieldPolicy,

    /// Handling of partial compound groups when reading rows back
    pub partial_compounds: PartialCompoundPolicy,

    /// Entries appended to the built-in booking table
    pub extra_fields: Vec<FieldEntry>,

    /// UI-only keys dropped in addition to the built-in ones
    pub extra_transient_keys: Vec<String>,
}

impl EngineConfig {
    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn with_partial_compounds(mut self, policy: PartialCompoundPolicy) -> Self {
        self.partial_compounds = policy;
        self
    }

    pub fn with_field(
        mut self,
        app_key: impl Into<String>,
        column: impl Into<String>,
        group: FieldGroup,
    ) -> Self {
        self.extra_fields.push(FieldEntry {
            app_key: app_key.into(),
            column: column.into(),
            group,
        });
        self
    }

    pub fn with_transient_key(mut self, key: impl Into<String>) -> Self {
        self.extra_transient_keys.push(key.into());
        self
    }
}

impl fmt::Display for UnknownFieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownFieldPolicy::Reject => write!(f, "reject"),
            UnknownFieldPolicy::Passthrough => write!(f, "passthrough"),
        }
    }
}

impl fmt::Display for PartialCompoundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialCompoundPolicy::Reject => write!(f, "reject"),
            PartialCompoundPolicy::Omit => write!(f, "omit"),
        }
    }
}
