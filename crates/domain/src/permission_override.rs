use std::collections::BTreeMap;
use std::str::FromStr;

use brigada_core::AppError;
use serde::{Deserialize, Serialize};

use crate::PermissionKey;

/// Stored override kind. Absence of a row means the value is inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideType {
    /// Explicitly grants the permission.
    Grant,
    /// Explicitly revokes the permission.
    Revoke,
}

impl OverrideType {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }

    /// Parses a transport value.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for OverrideType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "grant" => Ok(Self::Grant),
            "revoke" => Ok(Self::Revoke),
            _ => Err(AppError::Validation(format!(
                "unknown override type '{value}'"
            ))),
        }
    }
}

/// Three-state value of one override cell in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideState {
    /// No override; the template or role default decides.
    Inherited,
    /// Explicit grant.
    Grant,
    /// Explicit revoke.
    Revoke,
}

impl OverrideState {
    /// Returns the state following `self` on a click.
    ///
    /// The first click away from `Inherited` always changes the effective
    /// value; the cycle then visits the other explicit state and returns to
    /// `Inherited`, so every state is reached within three clicks.
    #[must_use]
    pub fn next(self, inherited_value: bool) -> Self {
        match (self, inherited_value) {
            (Self::Inherited, false) => Self::Grant,
            (Self::Grant, false) => Self::Revoke,
            (Self::Revoke, false) => Self::Inherited,
            (Self::Inherited, true) => Self::Revoke,
            (Self::Revoke, true) => Self::Grant,
            (Self::Grant, true) => Self::Inherited,
        }
    }

    /// Returns the effective value of this state given the inherited one.
    #[must_use]
    pub fn effective(self, inherited_value: bool) -> bool {
        match self {
            Self::Inherited => inherited_value,
            Self::Grant => true,
            Self::Revoke => false,
        }
    }

    /// Returns the stored override kind, if any.
    #[must_use]
    pub fn override_type(self) -> Option<OverrideType> {
        match self {
            Self::Inherited => None,
            Self::Grant => Some(OverrideType::Grant),
            Self::Revoke => Some(OverrideType::Revoke),
        }
    }
}

impl From<Option<OverrideType>> for OverrideState {
    fn from(value: Option<OverrideType>) -> Self {
        match value {
            None => Self::Inherited,
            Some(OverrideType::Grant) => Self::Grant,
            Some(OverrideType::Revoke) => Self::Revoke,
        }
    }
}

impl From<OverrideType> for OverrideState {
    fn from(value: OverrideType) -> Self {
        Self::from(Some(value))
    }
}

/// Sparse override map for one (user, branch) pair.
///
/// Holds at most one entry per key; setting a key again replaces the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSet {
    entries: BTreeMap<PermissionKey, OverrideType>,
}

impl OverrideSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from entries; later entries replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = (PermissionKey, OverrideType)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Returns the stored override for a key.
    #[must_use]
    pub fn get(&self, key: &PermissionKey) -> Option<OverrideType> {
        self.entries.get(key).copied()
    }

    /// Returns the editor state for a key.
    #[must_use]
    pub fn state(&self, key: &PermissionKey) -> OverrideState {
        OverrideState::from(self.get(key))
    }

    /// Sets the state of a key; `Inherited` removes the entry.
    pub fn set(&mut self, key: PermissionKey, state: OverrideState) {
        match state.override_type() {
            Some(override_type) => {
                self.entries.insert(key, override_type);
            }
            None => {
                self.entries.remove(&key);
            }
        }
    }

    /// Removes every override.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PermissionKey, OverrideType)> {
        self.entries.iter().map(|(key, value)| (key, *value))
    }

    /// Iterates keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &PermissionKey> {
        self.entries.keys()
    }

    /// Returns the number of explicit overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether every key is inherited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
