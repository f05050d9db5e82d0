use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use brigada_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PermissionCatalog, PermissionKey, PermissionScope, RoleName};

/// Unique identifier for a permission template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(Uuid);

impl TemplateId {
    /// Creates a new random template identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a template identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TemplateId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Named permission bundle that replaces role defaults when bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTemplate {
    id: TemplateId,
    name: NonEmptyString,
    scope: PermissionScope,
    is_active: bool,
}

impl PermissionTemplate {
    /// Creates a template header.
    pub fn new(
        id: TemplateId,
        name: impl Into<String>,
        scope: PermissionScope,
        is_active: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            scope,
            is_active,
        })
    }

    /// Returns the template id.
    #[must_use]
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Returns the template name, e.g. `Turno Noche`.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the scope every key of this template must share.
    #[must_use]
    pub fn scope(&self) -> PermissionScope {
        self.scope
    }

    /// Returns whether the template may be applied.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Activates or deactivates the template.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}

/// Binding of a template to a role for one scope inside a brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBinding {
    /// Bound role.
    pub role: RoleName,
    /// Scope the binding applies to.
    pub scope: PermissionScope,
    /// Bound template.
    pub template_id: TemplateId,
}

/// Checks that a template permission set only holds catalog keys of the
/// template scope.
///
/// Unknown keys are rejected with [`AppError::UnknownPermission`] before any
/// scope check so callers can tell the two apart.
pub fn validate_template_permissions(
    catalog: &PermissionCatalog,
    scope: PermissionScope,
    keys: &BTreeSet<PermissionKey>,
) -> AppResult<()> {
    let unknown = catalog.unknown_keys(keys);
    if !unknown.is_empty() {
        return Err(AppError::UnknownPermission(join_keys(&unknown)));
    }

    let foreign: Vec<PermissionKey> = keys
        .iter()
        .filter(|key| {
            catalog
                .get(key)
                .is_some_and(|definition| definition.scope() != scope)
        })
        .cloned()
        .collect();
    if !foreign.is_empty() {
        return Err(AppError::Validation(format!(
            "{scope} template cannot contain permissions of another scope: {}",
            join_keys(&foreign)
        )));
    }

    Ok(())
}

/// Returns stored keys that no longer exist in the catalog.
#[must_use]
pub fn stale_keys(
    catalog: &PermissionCatalog,
    keys: &BTreeSet<PermissionKey>,
) -> BTreeSet<PermissionKey> {
    catalog.unknown_keys(keys).into_iter().collect()
}

pub(crate) fn join_keys(keys: &[PermissionKey]) -> String {
    keys.iter()
        .map(PermissionKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
