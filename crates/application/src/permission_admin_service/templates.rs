use super::*;

use brigada_core::AppError;
use brigada_domain::{
    AuditAction, PermissionScope, TemplateBinding, TemplateId, stale_keys,
    validate_template_permissions,
};
use tracing::{info, warn};

use crate::{BindTemplateInput, CreateTemplateInput};

impl PermissionAdminService {
    /// Lists tenant templates, optionally limited to one scope.
    pub async fn list_templates(
        &self,
        actor: &UserIdentity,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionTemplate>> {
        self.require_template_manage_permission(actor).await?;
        self.repositories
            .templates
            .list_templates(actor.tenant_id(), scope)
            .await
    }

    /// Creates a template after validating its initial permission set.
    pub async fn create_template(
        &self,
        actor: &UserIdentity,
        input: CreateTemplateInput,
    ) -> AppResult<PermissionTemplate> {
        self.require_template_manage_permission(actor).await?;

        let name = input.name.trim().to_owned();
        if name.is_empty() {
            return Err(AppError::Validation(
                "template name must not be empty".to_owned(),
            ));
        }

        let catalog = self.resolution_service.load_catalog().await?;
        validate_template_permissions(&catalog, input.scope, &input.permissions)?;

        let permission_count = input.permissions.len();
        let template = self
            .repositories
            .templates
            .create_template(
                actor.tenant_id(),
                CreateTemplateInput {
                    name,
                    scope: input.scope,
                    permissions: input.permissions,
                },
            )
            .await?;

        info!(
            tenant_id = %actor.tenant_id(),
            template_id = %template.id(),
            scope = %template.scope(),
            permission_count,
            "permission template created"
        );

        self.append_audit_event(
            actor,
            AuditDraft {
                action: AuditAction::PermissionTemplateCreated,
                resource_type: "permission_template",
                resource_id: template.id().to_string(),
                detail: format!(
                    "created {} template '{}' with {permission_count} permissions",
                    template.scope(),
                    template.name()
                ),
            },
        )
        .await;

        Ok(template)
    }

    /// Loads a template into an editing session.
    ///
    /// Stored keys that left the catalog are kept out of the draft and
    /// reported in [`TemplateEditSession::stale_keys`].
    pub async fn open_template(
        &self,
        actor: &UserIdentity,
        template_id: TemplateId,
    ) -> AppResult<TemplateEditSession> {
        self.require_template_manage_permission(actor).await?;
        let template = self.find_template(actor, template_id).await?;

        let stored = self
            .repositories
            .templates
            .template_permissions(actor.tenant_id(), template_id)
            .await?;
        let catalog = self.resolution_service.load_catalog().await?;

        let stale = stale_keys(&catalog, &stored);
        if !stale.is_empty() {
            warn!(
                tenant_id = %actor.tenant_id(),
                %template_id,
                stale_keys = ?stale,
                "template references permissions missing from the catalog"
            );
        }

        let baseline = stored.difference(&stale).cloned().collect();
        Ok(TemplateEditSession {
            draft: TemplateDraft::new(template_id, template.scope(), baseline),
            template,
            stale_keys: stale,
        })
    }

    /// Replaces the stored template set with the draft working set.
    ///
    /// The draft becomes its own baseline only after the write succeeded.
    pub async fn save_template(
        &self,
        actor: &UserIdentity,
        draft: &mut TemplateDraft,
    ) -> AppResult<TemplateSaveOutcome> {
        self.require_template_manage_permission(actor).await?;

        if !draft.has_changes() {
            return Ok(TemplateSaveOutcome::NoChanges);
        }

        let catalog = self.resolution_service.load_catalog().await?;
        validate_template_permissions(&catalog, draft.scope(), draft.working())?;

        let template = self.find_template(actor, draft.template_id()).await?;
        if template.scope() != draft.scope() {
            return Err(AppError::Validation(format!(
                "draft scope '{}' does not match template scope '{}'",
                draft.scope(),
                template.scope()
            )));
        }

        let changes = draft.changes();
        self.repositories
            .templates
            .replace_template_permissions(actor.tenant_id(), template.id(), draft.working())
            .await?;
        draft.mark_saved();

        info!(
            tenant_id = %actor.tenant_id(),
            template_id = %template.id(),
            added = changes.added.len(),
            removed = changes.removed.len(),
            "permission template saved"
        );

        self.append_audit_event(
            actor,
            AuditDraft {
                action: AuditAction::PermissionTemplateSaved,
                resource_type: "permission_template",
                resource_id: template.id().to_string(),
                detail: format!(
                    "saved template '{}': {} added, {} removed",
                    template.name(),
                    changes.added.len(),
                    changes.removed.len()
                ),
            },
        )
        .await;

        Ok(TemplateSaveOutcome::Saved(changes))
    }

    /// Activates or deactivates a template.
    ///
    /// Bindings survive deactivation; resolution falls back to role defaults
    /// while the bound template is inactive.
    pub async fn set_template_active(
        &self,
        actor: &UserIdentity,
        template_id: TemplateId,
        is_active: bool,
    ) -> AppResult<PermissionTemplate> {
        self.require_template_manage_permission(actor).await?;

        let current = self.find_template(actor, template_id).await?;
        if current.is_active() == is_active {
            return Ok(current);
        }

        let template = self
            .repositories
            .templates
            .set_template_active(actor.tenant_id(), template_id, is_active)
            .await?;

        info!(
            tenant_id = %actor.tenant_id(),
            %template_id,
            is_active,
            "permission template activation changed"
        );

        let verb = if is_active { "activated" } else { "deactivated" };
        self.append_audit_event(
            actor,
            AuditDraft {
                action: AuditAction::PermissionTemplateActivationChanged,
                resource_type: "permission_template",
                resource_id: template_id.to_string(),
                detail: format!("{verb} template '{}'", template.name()),
            },
        )
        .await;

        Ok(template)
    }

    /// Binds a template to a role for one scope, or clears the binding.
    pub async fn bind_template(
        &self,
        actor: &UserIdentity,
        input: BindTemplateInput,
    ) -> AppResult<()> {
        self.require_template_manage_permission(actor).await?;

        if let Some(template_id) = input.template_id {
            let template = self.find_template(actor, template_id).await?;
            if !template.is_active() {
                return Err(AppError::Validation(format!(
                    "template '{}' is inactive and cannot be bound",
                    template.name()
                )));
            }
            if template.scope() != input.scope {
                return Err(AppError::Validation(format!(
                    "{} template '{}' cannot be bound for scope '{}'",
                    template.scope(),
                    template.name(),
                    input.scope
                )));
            }
        }

        let resource_id = format!("{}:{}", input.role, input.scope);
        let detail = match input.template_id {
            Some(template_id) => format!(
                "bound template '{template_id}' to role '{}' for scope '{}'",
                input.role, input.scope
            ),
            None => format!(
                "cleared template binding of role '{}' for scope '{}'",
                input.role, input.scope
            ),
        };

        self.repositories
            .templates
            .bind_template(actor.tenant_id(), input)
            .await?;

        self.append_audit_event(
            actor,
            AuditDraft {
                action: AuditAction::PermissionTemplateBound,
                resource_type: "permission_template_binding",
                resource_id,
                detail,
            },
        )
        .await;

        Ok(())
    }

    /// Lists template bindings of the actor brand.
    pub async fn list_bindings(&self, actor: &UserIdentity) -> AppResult<Vec<TemplateBinding>> {
        self.require_template_manage_permission(actor).await?;
        self.repositories
            .templates
            .list_bindings(actor.tenant_id())
            .await
    }

    async fn find_template(
        &self,
        actor: &UserIdentity,
        template_id: TemplateId,
    ) -> AppResult<PermissionTemplate> {
        self.repositories
            .templates
            .find_template(actor.tenant_id(), template_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("template '{template_id}' does not exist")))
    }
}
