mod audit;
mod catalog;
mod overrides;
mod staff;
mod templates;

use std::sync::Arc;

pub use audit::{AuditEvent, AuditRepository};
pub use catalog::{PermissionCatalogRepository, RoleDefaultsRepository};
pub use overrides::OverrideRepository;
pub use staff::StaffRoleRepository;
pub use templates::{BindTemplateInput, CreateTemplateInput, TemplateRepository};

/// Repository ports required to resolve and administer permissions.
#[derive(Clone)]
pub struct PermissionRepositories {
    /// Permission catalog source.
    pub catalog: Arc<dyn PermissionCatalogRepository>,
    /// Role default source.
    pub role_defaults: Arc<dyn RoleDefaultsRepository>,
    /// Template store.
    pub templates: Arc<dyn TemplateRepository>,
    /// Override store.
    pub overrides: Arc<dyn OverrideRepository>,
    /// Staff role lookup.
    pub staff_roles: Arc<dyn StaffRoleRepository>,
}
