use std::collections::BTreeSet;

use async_trait::async_trait;
use brigada_core::{AppResult, TenantId};
use brigada_domain::{
    PermissionKey, PermissionScope, PermissionTemplate, RoleName, TemplateBinding, TemplateId,
};

/// Input payload for creating a permission template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTemplateInput {
    /// Template name unique in tenant scope.
    pub name: String,
    /// Scope shared by every key of the template.
    pub scope: PermissionScope,
    /// Initial permission set.
    pub permissions: BTreeSet<PermissionKey>,
}

/// Input payload for binding a template to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindTemplateInput {
    /// Role receiving the template.
    pub role: RoleName,
    /// Scope of the binding.
    pub scope: PermissionScope,
    /// Template to bind, or `None` to fall back to role defaults.
    pub template_id: Option<TemplateId>,
}

/// Store port for permission templates and their bindings.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Lists tenant templates, optionally limited to a scope.
    async fn list_templates(
        &self,
        tenant_id: TenantId,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionTemplate>>;

    /// Finds one template header.
    async fn find_template(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<Option<PermissionTemplate>>;

    /// Returns the stored permission set of a template.
    async fn template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<BTreeSet<PermissionKey>>;

    /// Creates a template with its initial permissions.
    async fn create_template(
        &self,
        tenant_id: TenantId,
        input: CreateTemplateInput,
    ) -> AppResult<PermissionTemplate>;

    /// Replaces the stored permission set of a template.
    async fn replace_template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        permissions: &BTreeSet<PermissionKey>,
    ) -> AppResult<()>;

    /// Activates or deactivates a template and returns the updated header.
    async fn set_template_active(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        is_active: bool,
    ) -> AppResult<PermissionTemplate>;

    /// Returns the template bound to a role for a scope.
    async fn find_bound_template(
        &self,
        tenant_id: TenantId,
        role: &RoleName,
        scope: PermissionScope,
    ) -> AppResult<Option<TemplateId>>;

    /// Binds or unbinds a template for a role and scope.
    async fn bind_template(&self, tenant_id: TenantId, input: BindTemplateInput) -> AppResult<()>;

    /// Lists current bindings in tenant scope.
    async fn list_bindings(&self, tenant_id: TenantId) -> AppResult<Vec<TemplateBinding>>;
}
