use super::*;

use brigada_domain::{PermissionDefinition, PermissionScope};

impl PermissionAdminService {
    /// Returns catalog definitions, optionally limited to one scope.
    ///
    /// Any authenticated staff member may read the catalog.
    pub async fn list_catalog(
        &self,
        _actor: &UserIdentity,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionDefinition>> {
        self.repositories.catalog.list_definitions(scope).await
    }
}
