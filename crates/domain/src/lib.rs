//! Domain entities and invariants of the permission model.

#![forbid(unsafe_code)]

mod audit;
mod override_draft;
mod permission;
mod permission_override;
mod resolver;
mod role_defaults;
mod staff;
mod template;
mod template_draft;

pub use audit::AuditAction;
pub use override_draft::OverrideDraft;
pub use permission::{PermissionCatalog, PermissionDefinition, PermissionKey, PermissionScope};
pub use permission_override::{OverrideSet, OverrideState, OverrideType};
pub use resolver::{
    ConfigurationIssue, EffectivePermissions, PermissionSource, ResolutionInput,
    ResolvedPermission, TemplateLayer, resolve,
};
pub use role_defaults::RoleDefaults;
pub use staff::{BranchId, RoleName, UserId};
pub use template::{
    PermissionTemplate, TemplateBinding, TemplateId, stale_keys, validate_template_permissions,
};
pub use template_draft::{TemplateChanges, TemplateDraft};
