use super::*;

use brigada_core::{AppError, TenantId};
use brigada_domain::{AuditAction, OverrideSet, PermissionCatalog, PermissionScope, UserId};
use tracing::{error, info, warn};

impl PermissionAdminService {
    /// Loads the overrides of a (user, branch) pair into an editing session.
    pub async fn open_overrides(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<OverrideEditSession> {
        self.require_override_manage_permission(actor, branch_id)
            .await?;
        let tenant_id = actor.tenant_id();

        let stored = self
            .repositories
            .overrides
            .list_overrides(tenant_id, user_id, branch_id)
            .await?;
        let catalog = self.resolution_service.load_catalog().await?;
        let (baseline, stale_keys) = split_local_overrides(&catalog, &stored);
        if !stale_keys.is_empty() {
            warn!(
                %tenant_id,
                %user_id,
                %branch_id,
                stale_keys = ?stale_keys,
                "stored overrides reference unknown or brand permissions"
            );
        }

        let role = self
            .repositories
            .staff_roles
            .find_branch_role(tenant_id, user_id, branch_id)
            .await?;
        let effective = self
            .resolution_service
            .resolve_for_role(
                tenant_id,
                &catalog,
                role.as_ref(),
                PermissionScope::Local,
                &baseline,
            )
            .await?;

        Ok(OverrideEditSession {
            draft: OverrideDraft::new(user_id, branch_id, baseline),
            effective,
            stale_keys,
        })
    }

    /// Resolves the draft working set without writing it.
    pub async fn preview(
        &self,
        actor: &UserIdentity,
        draft: &OverrideDraft,
    ) -> AppResult<EffectivePermissions> {
        self.require_override_manage_permission(actor, draft.branch_id())
            .await?;
        self.resolution_service
            .preview_overrides(
                actor.tenant_id(),
                draft.user_id(),
                draft.branch_id(),
                draft.working(),
            )
            .await
    }

    /// Replaces the stored overrides with the draft working set.
    ///
    /// Unknown keys are rejected before anything is written. The draft
    /// becomes its own baseline only once the stored state is confirmed.
    pub async fn save_overrides(
        &self,
        actor: &UserIdentity,
        draft: &mut OverrideDraft,
    ) -> AppResult<OverrideSaveOutcome> {
        self.require_override_manage_permission(actor, draft.branch_id())
            .await?;

        if !draft.has_changes() {
            return Ok(OverrideSaveOutcome::NoChanges);
        }

        let catalog = self.resolution_service.load_catalog().await?;
        draft.validate(&catalog)?;

        let override_count = self
            .write_overrides(
                actor,
                &catalog,
                OverrideWrite {
                    user_id: draft.user_id(),
                    branch_id: draft.branch_id(),
                    original: draft.original(),
                    target: draft.working(),
                    action: AuditAction::PermissionOverridesSaved,
                },
            )
            .await?;
        draft.mark_saved();

        Ok(OverrideSaveOutcome::Saved { override_count })
    }

    /// Removes every stored override of a (user, branch) pair in one write.
    pub async fn reset_overrides(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<OverrideSaveOutcome> {
        self.require_override_manage_permission(actor, branch_id)
            .await?;

        let stored = self
            .repositories
            .overrides
            .list_overrides(actor.tenant_id(), user_id, branch_id)
            .await?;
        if stored.is_empty() {
            return Ok(OverrideSaveOutcome::NoChanges);
        }

        let catalog = self.resolution_service.load_catalog().await?;
        let override_count = self
            .write_overrides(
                actor,
                &catalog,
                OverrideWrite {
                    user_id,
                    branch_id,
                    original: &stored,
                    target: &OverrideSet::new(),
                    action: AuditAction::PermissionOverridesReset,
                },
            )
            .await?;

        Ok(OverrideSaveOutcome::Saved { override_count })
    }

    async fn write_overrides(
        &self,
        actor: &UserIdentity,
        catalog: &PermissionCatalog,
        write: OverrideWrite<'_>,
    ) -> AppResult<usize> {
        let tenant_id = actor.tenant_id();
        let (user_id, branch_id, original, target, action) = (
            write.user_id,
            write.branch_id,
            write.original,
            write.target,
            write.action,
        );

        if let Err(write_error) = self
            .repositories
            .overrides
            .replace_overrides(tenant_id, user_id, branch_id, target)
            .await
        {
            if matches!(write_error, AppError::PartialWrite(_)) {
                return Err(write_error);
            }

            return Err(self
                .classify_failed_write(tenant_id, catalog, &write, write_error)
                .await);
        }

        let stored = self
            .repositories
            .overrides
            .list_overrides(tenant_id, user_id, branch_id)
            .await?;
        if stored != *target {
            error!(
                %tenant_id,
                %user_id,
                %branch_id,
                expected = target.len(),
                stored = stored.len(),
                "override replace reported success but stored state differs"
            );
            return Err(AppError::PartialWrite(format!(
                "overrides of user '{user_id}' at branch '{branch_id}' were not fully applied"
            )));
        }

        info!(
            %tenant_id,
            %user_id,
            %branch_id,
            previous = original.len(),
            current = target.len(),
            action = action.as_str(),
            "permission overrides replaced"
        );

        self.append_audit_event(
            actor,
            AuditDraft {
                action,
                resource_type: "permission_override",
                resource_id: format!("{user_id}:{branch_id}"),
                detail: format!(
                    "replaced {} overrides with {} for user '{user_id}' at branch '{branch_id}'",
                    original.len(),
                    target.len()
                ),
            },
        )
        .await;

        Ok(target.len())
    }

    /// Decides whether a failed replace left the pair half-written.
    ///
    /// A stored state matching neither the baseline nor the target is a
    /// partial write; otherwise the original error stands.
    async fn classify_failed_write(
        &self,
        tenant_id: TenantId,
        catalog: &PermissionCatalog,
        write: &OverrideWrite<'_>,
        write_error: AppError,
    ) -> AppError {
        let stored = match self
            .repositories
            .overrides
            .list_overrides(tenant_id, write.user_id, write.branch_id)
            .await
        {
            Ok(stored) => stored,
            Err(fetch_error) => {
                warn!(
                    %tenant_id,
                    user_id = %write.user_id,
                    branch_id = %write.branch_id,
                    %fetch_error,
                    "could not re-read overrides after a failed replace"
                );
                return write_error;
            }
        };

        let (stored_local, _) = split_local_overrides(catalog, &stored);
        let (original_local, _) = split_local_overrides(catalog, write.original);
        if stored_local == original_local || stored_local == *write.target {
            return write_error;
        }

        error!(
            %tenant_id,
            user_id = %write.user_id,
            branch_id = %write.branch_id,
            %write_error,
            "override replace failed halfway"
        );
        AppError::PartialWrite(format!(
            "overrides of user '{}' at branch '{}' were only partially written: {write_error}",
            write.user_id, write.branch_id
        ))
    }
}

struct OverrideWrite<'a> {
    user_id: UserId,
    branch_id: BranchId,
    original: &'a OverrideSet,
    target: &'a OverrideSet,
    action: AuditAction,
}

/// Splits stored overrides into editable local entries and keys that are
/// unknown or brand-scoped.
fn split_local_overrides(
    catalog: &PermissionCatalog,
    stored: &OverrideSet,
) -> (OverrideSet, BTreeSet<PermissionKey>) {
    let mut local = OverrideSet::new();
    let mut stale = BTreeSet::new();
    for (key, override_type) in stored.iter() {
        let is_local = catalog
            .get(key)
            .is_some_and(|definition| definition.scope() == PermissionScope::Local);
        if is_local {
            local.set(key.clone(), override_type.into());
        } else {
            stale.insert(key.clone());
        }
    }

    (local, stale)
}
