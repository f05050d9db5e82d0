use async_trait::async_trait;
use brigada_core::{AppResult, TenantId};
use brigada_domain::{BranchId, RoleName, UserId};

/// Read port for staff role assignments.
#[async_trait]
pub trait StaffRoleRepository: Send + Sync {
    /// Returns the role a user holds at one branch.
    async fn find_branch_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<Option<RoleName>>;

    /// Returns the brand-wide role of a user.
    async fn find_brand_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<RoleName>>;
}
