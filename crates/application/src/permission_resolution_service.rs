use std::collections::BTreeSet;

use brigada_core::{AppError, AppResult, TenantId, UserIdentity};
use brigada_domain::{
    BranchId, EffectivePermissions, OverrideSet, PermissionCatalog, PermissionKey, PermissionScope,
    ResolutionInput, RoleDefaults, RoleName, TemplateLayer, UserId, resolve,
};
use tracing::{debug, warn};

use crate::PermissionRepositories;


/// Where a permission is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionContext {
    /// Local permissions at one branch, including overrides.
    Branch(BranchId),
    /// Brand-wide permissions; no override layer.
    Brand,
}

impl PermissionContext {
    /// Returns the permission scope resolved in this context.
    #[must_use]
    pub fn scope(&self) -> PermissionScope {
        match self {
            Self::Branch(_) => PermissionScope::Local,
            Self::Brand => PermissionScope::Brand,
        }
    }
}

/// Application service resolving effective permissions from stored layers.
#[derive(Clone)]
pub struct PermissionResolutionService {
    repositories: PermissionRepositories,
}

impl PermissionResolutionService {
    /// Creates a new resolution service from repository ports.
    #[must_use]
    pub fn new(repositories: PermissionRepositories) -> Self {
        Self { repositories }
    }

    /// Loads the full permission catalog.
    pub async fn load_catalog(&self) -> AppResult<PermissionCatalog> {
        let definitions = self.repositories.catalog.list_definitions(None).await?;
        PermissionCatalog::new(definitions)
    }

    /// Resolves the stored effective permissions of a user in a context.
    pub async fn effective_permissions(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        context: PermissionContext,
    ) -> AppResult<EffectivePermissions> {
        let (role, overrides) = match context {
            PermissionContext::Branch(branch_id) => {
                let role = self
                    .repositories
                    .staff_roles
                    .find_branch_role(tenant_id, user_id, branch_id)
                    .await?;
                let overrides = self
                    .repositories
                    .overrides
                    .list_overrides(tenant_id, user_id, branch_id)
                    .await?;
                (role, overrides)
            }
            PermissionContext::Brand => {
                let role = self
                    .repositories
                    .staff_roles
                    .find_brand_role(tenant_id, user_id)
                    .await?;
                (role, OverrideSet::new())
            }
        };

        let catalog = self.load_catalog().await?;
        self.resolve_for_role(
            tenant_id,
            &catalog,
            role.as_ref(),
            context.scope(),
            &overrides,
        )
        .await
    }

    /// Resolves local permissions of a user at a branch with an unsaved
    /// override set instead of the stored one.
    pub async fn preview_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        overrides: &OverrideSet,
    ) -> AppResult<EffectivePermissions> {
        let role = self
            .repositories
            .staff_roles
            .find_branch_role(tenant_id, user_id, branch_id)
            .await?;
        let catalog = self.load_catalog().await?;

        self.resolve_for_role(
            tenant_id,
            &catalog,
            role.as_ref(),
            PermissionScope::Local,
            overrides,
        )
        .await
    }

    /// Returns whether a user effectively holds a permission in a context.
    pub async fn has_permission(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        context: PermissionContext,
        permission_key: &str,
    ) -> AppResult<bool> {
        let key = PermissionKey::new(permission_key)?;
        let effective = self
            .effective_permissions(tenant_id, user_id, context)
            .await?;

        Ok(effective.is_granted(&key))
    }

    /// Ensures the actor effectively holds a permission in a context.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        context: PermissionContext,
        permission_key: &str,
    ) -> AppResult<()> {
        let user_id = UserId::from_uuid(actor.subject());
        if self
            .has_permission(actor.tenant_id(), user_id, context, permission_key)
            .await?
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{permission_key}' in tenant '{}'",
            actor.subject(),
            actor.tenant_id()
        )))
    }

    pub(crate) async fn resolve_for_role(
        &self,
        tenant_id: TenantId,
        catalog: &PermissionCatalog,
        role: Option<&RoleName>,
        scope: PermissionScope,
        overrides: &OverrideSet,
    ) -> AppResult<EffectivePermissions> {
        let mut role_defaults = RoleDefaults::new();
        let mut bound_template: Option<(PermissionScope, BTreeSet<PermissionKey>)> = None;

        if let Some(role) = role {
            let defaults = self.repositories.role_defaults.list_defaults(role).await?;
            role_defaults.set_role(role.clone(), defaults);
            bound_template = self.bound_template(tenant_id, role, scope).await?;
        } else {
            debug!(%tenant_id, %scope, "no staff role assigned, resolving with empty defaults");
        }

        let effective = resolve(&ResolutionInput {
            catalog,
            scope,
            role,
            role_defaults: &role_defaults,
            template: bound_template
                .as_ref()
                .map(|(template_scope, permissions)| TemplateLayer {
                    scope: *template_scope,
                    permissions,
                }),
            overrides,
        });

        for issue in effective.issues() {
            warn!(%tenant_id, ?issue, "permission configuration issue");
        }

        Ok(effective)
    }

    async fn bound_template(
        &self,
        tenant_id: TenantId,
        role: &RoleName,
        scope: PermissionScope,
    ) -> AppResult<Option<(PermissionScope, BTreeSet<PermissionKey>)>> {
        let Some(template_id) = self
            .repositories
            .templates
            .find_bound_template(tenant_id, role, scope)
            .await?
        else {
            return Ok(None);
        };

        let Some(template) = self
            .repositories
            .templates
            .find_template(tenant_id, template_id)
            .await?
        else {
            warn!(
                %tenant_id,
                %role,
                %template_id,
                "bound template does not exist, using role defaults"
            );
            return Ok(None);
        };

        if !template.is_active() {
            warn!(
                %tenant_id,
                %role,
                %template_id,
                "bound template is inactive, using role defaults"
            );
            return Ok(None);
        }

        let permissions = self
            .repositories
            .templates
            .template_permissions(tenant_id, template_id)
            .await?;

        Ok(Some((template.scope(), permissions)))
    }
}
