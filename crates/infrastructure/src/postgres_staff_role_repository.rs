use async_trait::async_trait;
use sqlx::PgPool;

use brigada_application::StaffRoleRepository;
use brigada_core::{AppError, AppResult, TenantId};
use brigada_domain::{BranchId, RoleName, UserId};

/// PostgreSQL-backed lookup of staff role assignments.
#[derive(Clone)]
pub struct PostgresStaffRoleRepository {
    pool: PgPool,
}

impl PostgresStaffRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRoleRepository for PostgresStaffRoleRepository {
    async fn find_branch_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<Option<RoleName>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM staff_branch_roles
            WHERE brand_id = $1 AND user_id = $2 AND branch_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(branch_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find branch role: {error}")))?
        .map(RoleName::new)
        .transpose()
    }

    async fn find_brand_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<RoleName>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM staff_brand_roles
            WHERE brand_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find brand role: {error}")))?
        .map(RoleName::new)
        .transpose()
    }
}
