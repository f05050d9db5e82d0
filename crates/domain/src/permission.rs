use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use brigada_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::RoleName;

const PERMISSION_KEY_MAX_LENGTH: usize = 128;

/// Unique identifier of a grantable capability, e.g. `manage_staff`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Local permission required to edit per-user branch overrides.
    pub const MANAGE_PERMISSIONS: &'static str = "manage_permissions";
    /// Brand permission required to edit and bind permission templates.
    pub const MANAGE_TEMPLATES: &'static str = "manage_templates";

    /// Creates a validated permission key.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::Validation(
                "permission key must not be empty".to_owned(),
            ));
        }

        if value.len() > PERMISSION_KEY_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "permission key must be at most {PERMISSION_KEY_MAX_LENGTH} characters"
            )));
        }

        let valid = value.chars().all(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || matches!(character, '_' | '.' | ':')
        });
        if !valid {
            return Err(AppError::Validation(format!(
                "permission key '{value}' may only contain lowercase letters, digits and '_.:'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the storage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Level at which a permission applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Applies to a single branch and supports per-user overrides.
    Local,
    /// Applies brand-wide; resolved from role or template only.
    Brand,
}

impl PermissionScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Brand => "brand",
        }
    }

    /// Parses a transport value into a scope.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for PermissionScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Self::Local),
            "brand" => Ok(Self::Brand),
            _ => Err(AppError::Validation(format!(
                "unknown permission scope '{value}'"
            ))),
        }
    }
}

impl Display for PermissionScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Catalog entry describing one permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    key: PermissionKey,
    name: NonEmptyString,
    description: Option<String>,
    module: NonEmptyString,
    scope: PermissionScope,
    min_role: RoleName,
}

impl PermissionDefinition {
    /// Creates a validated permission definition.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        module: impl Into<String>,
        scope: PermissionScope,
        min_role: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            key: PermissionKey::new(key)?,
            name: NonEmptyString::new(name)?,
            description: description.filter(|value| !value.trim().is_empty()),
            module: NonEmptyString::new(module)?,
            scope,
            min_role: RoleName::new(min_role)?,
        })
    }

    /// Returns the permission key.
    #[must_use]
    pub fn key(&self) -> &PermissionKey {
        &self.key
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the functional module, e.g. `pos` or `kitchen`.
    #[must_use]
    pub fn module(&self) -> &str {
        self.module.as_str()
    }

    /// Returns the scope.
    #[must_use]
    pub fn scope(&self) -> PermissionScope {
        self.scope
    }

    /// Returns the least privileged role this permission is meant for.
    #[must_use]
    pub fn min_role(&self) -> &RoleName {
        &self.min_role
    }
}

/// Ordered set of permission definitions with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    definitions: Vec<PermissionDefinition>,
    index: HashMap<PermissionKey, usize>,
}

impl PermissionCatalog {
    /// Builds a catalog, rejecting duplicate keys.
    pub fn new(definitions: Vec<PermissionDefinition>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (position, definition) in definitions.iter().enumerate() {
            if index.insert(definition.key().clone(), position).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate permission key '{}' in catalog",
                    definition.key()
                )));
            }
        }

        Ok(Self { definitions, index })
    }

    /// Returns the definition for a key.
    #[must_use]
    pub fn get(&self, key: &PermissionKey) -> Option<&PermissionDefinition> {
        self.index
            .get(key)
            .and_then(|position| self.definitions.get(*position))
    }

    /// Returns whether the key is part of the catalog.
    #[must_use]
    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the definitions that belong to one scope.
    pub fn in_scope(&self, scope: PermissionScope) -> impl Iterator<Item = &PermissionDefinition> {
        self.definitions
            .iter()
            .filter(move |definition| definition.scope() == scope)
    }

    /// Returns module names in first-seen order, optionally limited to a scope.
    #[must_use]
    pub fn modules(&self, scope: Option<PermissionScope>) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for definition in &self.definitions {
            if scope.is_some_and(|scope| definition.scope() != scope) {
                continue;
            }
            if !modules.contains(&definition.module()) {
                modules.push(definition.module());
            }
        }
        modules
    }

    /// Returns exactly the keys of one module within a scope.
    #[must_use]
    pub fn keys_in_module(&self, module: &str, scope: PermissionScope) -> BTreeSet<PermissionKey> {
        self.in_scope(scope)
            .filter(|definition| definition.module() == module)
            .map(|definition| definition.key().clone())
            .collect()
    }

    /// Returns the keys from `keys` that the catalog does not know.
    pub fn unknown_keys<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a PermissionKey>,
    ) -> Vec<PermissionKey> {
        keys.into_iter()
            .filter(|key| !self.contains(key))
            .cloned()
            .collect()
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
