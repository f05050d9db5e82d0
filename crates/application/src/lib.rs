//! Application services and ports.

#![forbid(unsafe_code)]

mod permission_admin_service;
mod permission_ports;
mod permission_resolution_service;
mod selection_guard;

#[cfg(test)]
mod test_support;

pub use permission_admin_service::{
    OverrideEditSession, OverrideSaveOutcome, PermissionAdminService, TemplateEditSession,
    TemplateSaveOutcome,
};
pub use permission_ports::{
    AuditEvent, AuditRepository, BindTemplateInput, CreateTemplateInput, OverrideRepository,
    PermissionCatalogRepository, PermissionRepositories, RoleDefaultsRepository,
    StaffRoleRepository, TemplateRepository,
};
pub use permission_resolution_service::{PermissionContext, PermissionResolutionService};
pub use selection_guard::{Fetched, OverrideSelectionLoader, SelectionGuard, SelectionTicket};
