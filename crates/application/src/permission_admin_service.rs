use std::collections::BTreeSet;
use std::sync::Arc;

use brigada_core::{AppResult, UserIdentity};
use brigada_domain::{
    BranchId, EffectivePermissions, OverrideDraft, PermissionKey, PermissionTemplate,
    TemplateChanges, TemplateDraft,
};
use tracing::error;

use crate::{
    AuditEvent, AuditRepository, PermissionContext, PermissionRepositories,
    PermissionResolutionService,
};

mod catalog;
mod overrides;
mod templates;


/// Loaded template editing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEditSession {
    /// Template header.
    pub template: PermissionTemplate,
    /// Draft seeded with the stored keys that still exist in the catalog.
    pub draft: TemplateDraft,
    /// Stored keys missing from the catalog; dropped on the next save.
    pub stale_keys: BTreeSet<PermissionKey>,
}

/// Result of saving a template draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSaveOutcome {
    /// The draft matched its baseline; nothing was written.
    NoChanges,
    /// The stored set now equals the draft working set.
    Saved(TemplateChanges),
}

/// Loaded override editing state for one (user, branch) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEditSession {
    /// Draft seeded with the stored local overrides.
    pub draft: OverrideDraft,
    /// Effective permissions with the stored overrides applied.
    pub effective: EffectivePermissions,
    /// Stored override keys that are unknown or not local; dropped on the
    /// next save.
    pub stale_keys: BTreeSet<PermissionKey>,
}

/// Result of writing overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSaveOutcome {
    /// The draft matched its baseline; nothing was written.
    NoChanges,
    /// The stored overrides now equal the requested set.
    Saved {
        /// Number of explicit overrides stored.
        override_count: usize,
    },
}

/// Application service for template and override administration.
#[derive(Clone)]
pub struct PermissionAdminService {
    resolution_service: PermissionResolutionService,
    repositories: PermissionRepositories,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PermissionAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        resolution_service: PermissionResolutionService,
        repositories: PermissionRepositories,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            resolution_service,
            repositories,
            audit_repository,
        }
    }

    async fn require_template_manage_permission(&self, actor: &UserIdentity) -> AppResult<()> {
        self.resolution_service
            .require_permission(
                actor,
                PermissionContext::Brand,
                PermissionKey::MANAGE_TEMPLATES,
            )
            .await
    }

    async fn require_override_manage_permission(
        &self,
        actor: &UserIdentity,
        branch_id: BranchId,
    ) -> AppResult<()> {
        self.resolution_service
            .require_permission(
                actor,
                PermissionContext::Branch(branch_id),
                PermissionKey::MANAGE_PERMISSIONS,
            )
            .await
    }

    /// Records an audit event for a write that is already committed.
    ///
    /// A failing audit store cannot undo the write, so the failure is logged
    /// and the caller still reports success.
    async fn append_audit_event(&self, actor: &UserIdentity, event: AuditDraft) {
        let action = event.action;
        let resource_id = event.resource_id.clone();
        if let Err(error) = self
            .audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.subject().to_string(),
                action,
                resource_type: event.resource_type.to_owned(),
                resource_id: event.resource_id,
                detail: Some(event.detail),
            })
            .await
        {
            error!(
                tenant_id = %actor.tenant_id(),
                action = action.as_str(),
                resource_type = event.resource_type,
                %resource_id,
                %error,
                "failed to append audit event for a committed write"
            );
        }
    }
}

struct AuditDraft {
    action: brigada_domain::AuditAction,
    resource_type: &'static str,
    resource_id: String,
    detail: String,
}
