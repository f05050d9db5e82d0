use std::collections::BTreeSet;

use async_trait::async_trait;
use brigada_core::AppResult;
use brigada_domain::{PermissionDefinition, PermissionKey, PermissionScope, RoleName};

/// Read port for the system-wide permission catalog.
#[async_trait]
pub trait PermissionCatalogRepository: Send + Sync {
    /// Lists definitions, optionally limited to one scope.
    async fn list_definitions(
        &self,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionDefinition>>;
}

/// Read port for role default grants.
#[async_trait]
pub trait RoleDefaultsRepository: Send + Sync {
    /// Lists the keys granted by default to a role. Unknown roles yield an
    /// empty set.
    async fn list_defaults(&self, role: &RoleName) -> AppResult<BTreeSet<PermissionKey>>;
}
