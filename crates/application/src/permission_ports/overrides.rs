use async_trait::async_trait;
use brigada_core::{AppResult, TenantId};
use brigada_domain::{BranchId, OverrideSet, UserId};

/// Store port for per-user per-branch overrides.
#[async_trait]
pub trait OverrideRepository: Send + Sync {
    /// Lists the stored overrides of a (user, branch) pair.
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<OverrideSet>;

    /// Replaces every stored override of a (user, branch) pair.
    ///
    /// After success the stored set equals `overrides` exactly. Adapters that
    /// cannot apply the replace atomically must return
    /// [`brigada_core::AppError::PartialWrite`] when only part of it landed.
    async fn replace_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        overrides: &OverrideSet,
    ) -> AppResult<()>;
}
