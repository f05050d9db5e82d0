use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use brigada_application::{
    AuditEvent, AuditRepository, BindTemplateInput, CreateTemplateInput, OverrideRepository,
    PermissionCatalogRepository, PermissionRepositories, RoleDefaultsRepository,
    StaffRoleRepository, TemplateRepository,
};
use brigada_core::{AppError, AppResult, TenantId};
use brigada_domain::{
    BranchId, OverrideSet, PermissionDefinition, PermissionKey, PermissionScope,
    PermissionTemplate, RoleName, TemplateBinding, TemplateId, UserId,
};
use tokio::sync::RwLock;


#[derive(Debug, Clone)]
struct StoredTemplate {
    template: PermissionTemplate,
    permissions: BTreeSet<PermissionKey>,
}

/// In-memory implementation of every permission port.
///
/// Replaces are applied under one write lock, so readers never observe a
/// half-applied set.
#[derive(Debug, Default)]
pub struct InMemoryPermissionRepository {
    definitions: RwLock<Vec<PermissionDefinition>>,
    role_defaults: RwLock<HashMap<RoleName, BTreeSet<PermissionKey>>>,
    templates: RwLock<HashMap<(TenantId, TemplateId), StoredTemplate>>,
    bindings: RwLock<HashMap<(TenantId, RoleName, PermissionScope), TemplateId>>,
    overrides: RwLock<HashMap<(TenantId, UserId, BranchId), OverrideSet>>,
    branch_roles: RwLock<HashMap<(TenantId, UserId, BranchId), RoleName>>,
    brand_roles: RwLock<HashMap<(TenantId, UserId), RoleName>>,
    audit_events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryPermissionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires this repository into every permission port.
    #[must_use]
    pub fn repositories(self: &Arc<Self>) -> PermissionRepositories {
        PermissionRepositories {
            catalog: self.clone(),
            role_defaults: self.clone(),
            templates: self.clone(),
            overrides: self.clone(),
            staff_roles: self.clone(),
        }
    }

    /// Adds or replaces a catalog definition.
    pub async fn insert_definition(&self, definition: PermissionDefinition) {
        let mut definitions = self.definitions.write().await;
        definitions.retain(|existing| existing.key() != definition.key());
        definitions.push(definition);
    }

    /// Removes a catalog definition, leaving templates and overrides untouched.
    pub async fn remove_definition(&self, key: &PermissionKey) {
        self.definitions
            .write()
            .await
            .retain(|definition| definition.key() != key);
    }

    /// Replaces the default permissions of a role.
    pub async fn set_role_defaults(&self, role: RoleName, keys: BTreeSet<PermissionKey>) {
        self.role_defaults.write().await.insert(role, keys);
    }

    /// Assigns a role to a user at one branch.
    pub async fn assign_branch_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        role: RoleName,
    ) {
        self.branch_roles
            .write()
            .await
            .insert((tenant_id, user_id, branch_id), role);
    }

    /// Assigns a brand-wide role to a user.
    pub async fn assign_brand_role(&self, tenant_id: TenantId, user_id: UserId, role: RoleName) {
        self.brand_roles
            .write()
            .await
            .insert((tenant_id, user_id), role);
    }

    /// Returns every audit event appended so far.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_events.read().await.clone()
    }
}

#[async_trait]
impl PermissionCatalogRepository for InMemoryPermissionRepository {
    async fn list_definitions(
        &self,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionDefinition>> {
        Ok(self
            .definitions
            .read()
            .await
            .iter()
            .filter(|definition| scope.is_none_or(|scope| definition.scope() == scope))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RoleDefaultsRepository for InMemoryPermissionRepository {
    async fn list_defaults(&self, role: &RoleName) -> AppResult<BTreeSet<PermissionKey>> {
        Ok(self
            .role_defaults
            .read()
            .await
            .get(role)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TemplateRepository for InMemoryPermissionRepository {
    async fn list_templates(
        &self,
        tenant_id: TenantId,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionTemplate>> {
        let templates = self.templates.read().await;

        let mut values: Vec<PermissionTemplate> = templates
            .iter()
            .filter(|((stored_tenant_id, _), stored)| {
                stored_tenant_id == &tenant_id
                    && scope.is_none_or(|scope| stored.template.scope() == scope)
            })
            .map(|(_, stored)| stored.template.clone())
            .collect();
        values.sort_by(|left, right| {
            (left.scope().as_str(), left.name().as_str())
                .cmp(&(right.scope().as_str(), right.name().as_str()))
        });

        Ok(values)
    }

    async fn find_template(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<Option<PermissionTemplate>> {
        Ok(self
            .templates
            .read()
            .await
            .get(&(tenant_id, template_id))
            .map(|stored| stored.template.clone()))
    }

    async fn template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<BTreeSet<PermissionKey>> {
        Ok(self
            .templates
            .read()
            .await
            .get(&(tenant_id, template_id))
            .map(|stored| stored.permissions.clone())
            .unwrap_or_default())
    }

    async fn create_template(
        &self,
        tenant_id: TenantId,
        input: CreateTemplateInput,
    ) -> AppResult<PermissionTemplate> {
        let mut templates = self.templates.write().await;

        let name_taken = templates.iter().any(|((stored_tenant_id, _), stored)| {
            stored_tenant_id == &tenant_id && stored.template.name().as_str() == input.name
        });
        if name_taken {
            return Err(AppError::Conflict(format!(
                "template '{}' already exists",
                input.name
            )));
        }

        let template = PermissionTemplate::new(TemplateId::new(), input.name, input.scope, true)?;
        templates.insert(
            (tenant_id, template.id()),
            StoredTemplate {
                template: template.clone(),
                permissions: input.permissions,
            },
        );

        Ok(template)
    }

    async fn replace_template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        permissions: &BTreeSet<PermissionKey>,
    ) -> AppResult<()> {
        let mut templates = self.templates.write().await;
        let stored = templates
            .get_mut(&(tenant_id, template_id))
            .ok_or_else(|| AppError::NotFound(format!("template '{template_id}' does not exist")))?;

        stored.permissions = permissions.clone();
        Ok(())
    }

    async fn set_template_active(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        is_active: bool,
    ) -> AppResult<PermissionTemplate> {
        let mut templates = self.templates.write().await;
        let stored = templates
            .get_mut(&(tenant_id, template_id))
            .ok_or_else(|| AppError::NotFound(format!("template '{template_id}' does not exist")))?;

        stored.template.set_active(is_active);
        Ok(stored.template.clone())
    }

    async fn find_bound_template(
        &self,
        tenant_id: TenantId,
        role: &RoleName,
        scope: PermissionScope,
    ) -> AppResult<Option<TemplateId>> {
        Ok(self
            .bindings
            .read()
            .await
            .get(&(tenant_id, role.clone(), scope))
            .copied())
    }

    async fn bind_template(&self, tenant_id: TenantId, input: BindTemplateInput) -> AppResult<()> {
        let key = (tenant_id, input.role, input.scope);

        match input.template_id {
            Some(template_id) => {
                if !self
                    .templates
                    .read()
                    .await
                    .contains_key(&(tenant_id, template_id))
                {
                    return Err(AppError::NotFound(format!(
                        "template '{template_id}' does not exist"
                    )));
                }
                self.bindings.write().await.insert(key, template_id);
            }
            None => {
                self.bindings.write().await.remove(&key);
            }
        }

        Ok(())
    }

    async fn list_bindings(&self, tenant_id: TenantId) -> AppResult<Vec<TemplateBinding>> {
        let mut bindings: Vec<TemplateBinding> = self
            .bindings
            .read()
            .await
            .iter()
            .filter(|((stored_tenant_id, _, _), _)| stored_tenant_id == &tenant_id)
            .map(|((_, role, scope), template_id)| TemplateBinding {
                role: role.clone(),
                scope: *scope,
                template_id: *template_id,
            })
            .collect();
        bindings.sort_by(|left, right| {
            (left.role.as_str(), left.scope.as_str())
                .cmp(&(right.role.as_str(), right.scope.as_str()))
        });

        Ok(bindings)
    }
}

#[async_trait]
impl OverrideRepository for InMemoryPermissionRepository {
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<OverrideSet> {
        Ok(self
            .overrides
            .read()
            .await
            .get(&(tenant_id, user_id, branch_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        overrides: &OverrideSet,
    ) -> AppResult<()> {
        let mut stored = self.overrides.write().await;
        if overrides.is_empty() {
            stored.remove(&(tenant_id, user_id, branch_id));
        } else {
            stored.insert((tenant_id, user_id, branch_id), overrides.clone());
        }

        Ok(())
    }
}

#[async_trait]
impl StaffRoleRepository for InMemoryPermissionRepository {
    async fn find_branch_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<Option<RoleName>> {
        Ok(self
            .branch_roles
            .read()
            .await
            .get(&(tenant_id, user_id, branch_id))
            .cloned())
    }

    async fn find_brand_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<RoleName>> {
        Ok(self
            .brand_roles
            .read()
            .await
            .get(&(tenant_id, user_id))
            .cloned())
    }
}

#[async_trait]
impl AuditRepository for InMemoryPermissionRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.write().await.push(event);
        Ok(())
    }
}
