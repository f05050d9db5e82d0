use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use brigada_core::{AppError, AppResult, TenantId, UserIdentity};
use brigada_domain::{
    BranchId, OverrideSet, PermissionDefinition, PermissionKey, PermissionScope,
    PermissionTemplate, RoleName, TemplateBinding, TemplateId, UserId,
};

use crate::{
    AuditEvent, AuditRepository, BindTemplateInput, CreateTemplateInput, OverrideRepository,
    PermissionCatalogRepository, PermissionRepositories, RoleDefaultsRepository,
    StaffRoleRepository, TemplateRepository,
};

pub(crate) const LOCAL_KEYS: &[(&str, &str)] = &[
    ("view_orders", "pos"),
    ("create_order", "pos"),
    ("void_order", "pos"),
    ("manage_cash", "pos"),
    ("view_kds", "kitchen"),
    ("manage_staff", "staff"),
    ("manage_permissions", "staff"),
];

pub(crate) const BRAND_KEYS: &[(&str, &str)] = &[
    ("manage_menu", "menu"),
    ("view_reports", "reports"),
    ("manage_templates", "staff"),
];

pub(crate) fn key(value: &str) -> PermissionKey {
    PermissionKey::new(value).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn keys(values: &[&str]) -> BTreeSet<PermissionKey> {
    values.iter().map(|value| key(value)).collect()
}

pub(crate) fn role(value: &str) -> RoleName {
    RoleName::new(value).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn actor(tenant_id: TenantId, user_id: UserId) -> UserIdentity {
    UserIdentity::new(user_id.as_uuid(), Some("Ana".to_owned()), tenant_id)
}

/// How the fake override store reacts to a replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReplaceBehavior {
    Apply,
    /// Writes only the first `n` entries of the target set, then errors.
    FailAfter(usize),
    /// Reports success without storing anything.
    Drop,
    /// Errors before touching storage.
    Reject,
}

pub(crate) struct FakePermissionStore {
    pub definitions: Mutex<Vec<PermissionDefinition>>,
    pub role_defaults: Mutex<HashMap<RoleName, BTreeSet<PermissionKey>>>,
    pub templates: Mutex<Vec<(TenantId, PermissionTemplate, BTreeSet<PermissionKey>)>>,
    pub bindings: Mutex<HashMap<(TenantId, RoleName, PermissionScope), TemplateId>>,
    pub overrides: Mutex<HashMap<(TenantId, UserId, BranchId), OverrideSet>>,
    pub branch_roles: Mutex<HashMap<(TenantId, UserId, BranchId), RoleName>>,
    pub brand_roles: Mutex<HashMap<(TenantId, UserId), RoleName>>,
    pub replace_behavior: Mutex<ReplaceBehavior>,
    pub override_writes: Mutex<usize>,
    pub template_writes: Mutex<usize>,
}

impl FakePermissionStore {
    pub(crate) fn seeded() -> Self {
        let mut definitions = Vec::new();
        for (value, module) in LOCAL_KEYS {
            definitions.push(
                PermissionDefinition::new(
                    *value,
                    *value,
                    None,
                    *module,
                    PermissionScope::Local,
                    "cajero",
                )
                .unwrap_or_else(|_| unreachable!()),
            );
        }
        for (value, module) in BRAND_KEYS {
            definitions.push(
                PermissionDefinition::new(
                    *value,
                    *value,
                    None,
                    *module,
                    PermissionScope::Brand,
                    "franquiciado",
                )
                .unwrap_or_else(|_| unreachable!()),
            );
        }

        let role_defaults = HashMap::from([
            (role("cajero"), keys(&["view_orders", "create_order"])),
            (role("cocinero"), keys(&["view_orders", "view_kds"])),
            (
                role("encargado"),
                keys(&[
                    "view_orders",
                    "create_order",
                    "void_order",
                    "manage_cash",
                    "view_kds",
                    "manage_staff",
                    "manage_permissions",
                ]),
            ),
            (
                role("franquiciado"),
                keys(&["manage_menu", "view_reports", "manage_templates"]),
            ),
        ]);

        Self {
            definitions: Mutex::new(definitions),
            role_defaults: Mutex::new(role_defaults),
            templates: Mutex::new(Vec::new()),
            bindings: Mutex::new(HashMap::new()),
            overrides: Mutex::new(HashMap::new()),
            branch_roles: Mutex::new(HashMap::new()),
            brand_roles: Mutex::new(HashMap::new()),
            replace_behavior: Mutex::new(ReplaceBehavior::Apply),
            override_writes: Mutex::new(0),
            template_writes: Mutex::new(0),
        }
    }

    pub(crate) fn repositories(self: &Arc<Self>) -> PermissionRepositories {
        PermissionRepositories {
            catalog: self.clone(),
            role_defaults: self.clone(),
            templates: self.clone(),
            overrides: self.clone(),
            staff_roles: self.clone(),
        }
    }

    pub(crate) async fn assign_branch_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        role_name: &str,
    ) {
        self.branch_roles
            .lock()
            .await
            .insert((tenant_id, user_id, branch_id), role(role_name));
    }

    pub(crate) async fn assign_brand_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_name: &str,
    ) {
        self.brand_roles
            .lock()
            .await
            .insert((tenant_id, user_id), role(role_name));
    }

    pub(crate) async fn insert_template(
        &self,
        tenant_id: TenantId,
        name: &str,
        scope: PermissionScope,
        is_active: bool,
        permissions: BTreeSet<PermissionKey>,
    ) -> TemplateId {
        let template = PermissionTemplate::new(TemplateId::new(), name, scope, is_active)
            .unwrap_or_else(|_| unreachable!());
        let template_id = template.id();
        self.templates
            .lock()
            .await
            .push((tenant_id, template, permissions));
        template_id
    }

    pub(crate) async fn bind(
        &self,
        tenant_id: TenantId,
        role_name: &str,
        scope: PermissionScope,
        template_id: TemplateId,
    ) {
        self.bindings
            .lock()
            .await
            .insert((tenant_id, role(role_name), scope), template_id);
    }

    pub(crate) async fn store_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        overrides: OverrideSet,
    ) {
        self.overrides
            .lock()
            .await
            .insert((tenant_id, user_id, branch_id), overrides);
    }

    pub(crate) async fn stored_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> OverrideSet {
        self.overrides
            .lock()
            .await
            .get(&(tenant_id, user_id, branch_id))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) async fn set_replace_behavior(&self, behavior: ReplaceBehavior) {
        *self.replace_behavior.lock().await = behavior;
    }
}

#[async_trait]
impl PermissionCatalogRepository for FakePermissionStore {
    async fn list_definitions(
        &self,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionDefinition>> {
        Ok(self
            .definitions
            .lock()
            .await
            .iter()
            .filter(|definition| scope.is_none_or(|scope| definition.scope() == scope))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RoleDefaultsRepository for FakePermissionStore {
    async fn list_defaults(&self, role: &RoleName) -> AppResult<BTreeSet<PermissionKey>> {
        Ok(self
            .role_defaults
            .lock()
            .await
            .get(role)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TemplateRepository for FakePermissionStore {
    async fn list_templates(
        &self,
        tenant_id: TenantId,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionTemplate>> {
        Ok(self
            .templates
            .lock()
            .await
            .iter()
            .filter(|(stored_tenant_id, template, _)| {
                *stored_tenant_id == tenant_id
                    && scope.is_none_or(|scope| template.scope() == scope)
            })
            .map(|(_, template, _)| template.clone())
            .collect())
    }

    async fn find_template(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<Option<PermissionTemplate>> {
        Ok(self
            .templates
            .lock()
            .await
            .iter()
            .find(|(stored_tenant_id, template, _)| {
                *stored_tenant_id == tenant_id && template.id() == template_id
            })
            .map(|(_, template, _)| template.clone()))
    }

    async fn template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<BTreeSet<PermissionKey>> {
        Ok(self
            .templates
            .lock()
            .await
            .iter()
            .find(|(stored_tenant_id, template, _)| {
                *stored_tenant_id == tenant_id && template.id() == template_id
            })
            .map(|(_, _, permissions)| permissions.clone())
            .unwrap_or_default())
    }

    async fn create_template(
        &self,
        tenant_id: TenantId,
        input: CreateTemplateInput,
    ) -> AppResult<PermissionTemplate> {
        let mut templates = self.templates.lock().await;
        if templates.iter().any(|(stored_tenant_id, template, _)| {
            *stored_tenant_id == tenant_id && template.name().as_str() == input.name
        }) {
            return Err(AppError::Conflict(format!(
                "template '{}' already exists",
                input.name
            )));
        }

        let template = PermissionTemplate::new(TemplateId::new(), input.name, input.scope, true)?;
        templates.push((tenant_id, template.clone(), input.permissions));
        Ok(template)
    }

    async fn replace_template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        permissions: &BTreeSet<PermissionKey>,
    ) -> AppResult<()> {
        *self.template_writes.lock().await += 1;
        let mut templates = self.templates.lock().await;
        let Some((_, _, stored)) = templates.iter_mut().find(|(stored_tenant_id, template, _)| {
            *stored_tenant_id == tenant_id && template.id() == template_id
        }) else {
            return Err(AppError::NotFound(format!(
                "template '{template_id}' does not exist"
            )));
        };

        *stored = permissions.clone();
        Ok(())
    }

    async fn set_template_active(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        is_active: bool,
    ) -> AppResult<PermissionTemplate> {
        let mut templates = self.templates.lock().await;
        let Some((_, template, _)) = templates.iter_mut().find(|(stored_tenant_id, template, _)| {
            *stored_tenant_id == tenant_id && template.id() == template_id
        }) else {
            return Err(AppError::NotFound(format!(
                "template '{template_id}' does not exist"
            )));
        };

        template.set_active(is_active);
        Ok(template.clone())
    }

    async fn find_bound_template(
        &self,
        tenant_id: TenantId,
        role: &RoleName,
        scope: PermissionScope,
    ) -> AppResult<Option<TemplateId>> {
        Ok(self
            .bindings
            .lock()
            .await
            .get(&(tenant_id, role.clone(), scope))
            .copied())
    }

    async fn bind_template(&self, tenant_id: TenantId, input: BindTemplateInput) -> AppResult<()> {
        let mut bindings = self.bindings.lock().await;
        let binding_key = (tenant_id, input.role, input.scope);
        match input.template_id {
            Some(template_id) => {
                bindings.insert(binding_key, template_id);
            }
            None => {
                bindings.remove(&binding_key);
            }
        }
        Ok(())
    }

    async fn list_bindings(&self, tenant_id: TenantId) -> AppResult<Vec<TemplateBinding>> {
        let mut bindings: Vec<TemplateBinding> = self
            .bindings
            .lock()
            .await
            .iter()
            .filter(|((stored_tenant_id, _, _), _)| *stored_tenant_id == tenant_id)
            .map(|((_, role, scope), template_id)| TemplateBinding {
                role: role.clone(),
                scope: *scope,
                template_id: *template_id,
            })
            .collect();
        bindings.sort_by(|left, right| left.role.cmp(&right.role));
        Ok(bindings)
    }
}

#[async_trait]
impl OverrideRepository for FakePermissionStore {
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<OverrideSet> {
        Ok(self.stored_overrides(tenant_id, user_id, branch_id).await)
    }

    async fn replace_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        overrides: &OverrideSet,
    ) -> AppResult<()> {
        *self.override_writes.lock().await += 1;
        let behavior = *self.replace_behavior.lock().await;
        let mut stored = self.overrides.lock().await;

        match behavior {
            ReplaceBehavior::Apply => {
                stored.insert((tenant_id, user_id, branch_id), overrides.clone());
                Ok(())
            }
            ReplaceBehavior::FailAfter(count) => {
                let entry = stored.entry((tenant_id, user_id, branch_id)).or_default();
                for (key, override_type) in overrides.iter().take(count) {
                    entry.set(key.clone(), override_type.into());
                }
                Err(AppError::Internal("override store went away".to_owned()))
            }
            ReplaceBehavior::Drop => Ok(()),
            ReplaceBehavior::Reject => {
                Err(AppError::Internal("override store unavailable".to_owned()))
            }
        }
    }
}

#[async_trait]
impl StaffRoleRepository for FakePermissionStore {
    async fn find_branch_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<Option<RoleName>> {
        Ok(self
            .branch_roles
            .lock()
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
            .lock()
            .await
            .get(&(tenant_id, user_id))
            .cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub events: Mutex<Vec<AuditEvent>>,
    /// Makes every append fail once set.
    pub unavailable: Mutex<bool>,
}

impl FakeAuditRepository {
    pub(crate) async fn go_offline(&self) {
        *self.unavailable.lock().await = true;
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if *self.unavailable.lock().await {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }

        self.events.lock().await.push(event);
        Ok(())
    }
}
