use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by permission administration use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission template is created.
    PermissionTemplateCreated,
    /// Emitted when a template permission set is replaced.
    PermissionTemplateSaved,
    /// Emitted when a template is bound to or unbound from a role.
    PermissionTemplateBound,
    /// Emitted when a template is activated or deactivated.
    PermissionTemplateActivationChanged,
    /// Emitted when the overrides of a (user, branch) pair are replaced.
    PermissionOverridesSaved,
    /// Emitted when the overrides of a (user, branch) pair are reset.
    PermissionOverridesReset,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionTemplateCreated => "permission.template.created",
            Self::PermissionTemplateSaved => "permission.template.saved",
            Self::PermissionTemplateBound => "permission.template.bound",
            Self::PermissionTemplateActivationChanged => "permission.template.activation_changed",
            Self::PermissionOverridesSaved => "permission.overrides.saved",
            Self::PermissionOverridesReset => "permission.overrides.reset",
        }
    }
}
