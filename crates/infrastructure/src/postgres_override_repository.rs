use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use brigada_application::OverrideRepository;
use brigada_core::{AppError, AppResult, TenantId};
use brigada_domain::{BranchId, OverrideSet, OverrideType, PermissionKey, UserId};

/// PostgreSQL-backed store for per-user per-branch permission overrides.
#[derive(Clone)]
pub struct PostgresOverrideRepository {
    pool: PgPool,
}

impl PostgresOverrideRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OverrideRow {
    permission_key: String,
    override_type: String,
}

#[async_trait]
impl OverrideRepository for PostgresOverrideRepository {
    async fn list_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<OverrideSet> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT permission_key, override_type
            FROM user_permission_overrides
            WHERE brand_id = $1 AND user_id = $2 AND branch_id = $3
            ORDER BY permission_key
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(branch_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list overrides for user '{user_id}' at branch '{branch_id}': {error}"
            ))
        })?;

        let entries = rows
            .into_iter()
            .map(|row| {
                Ok((
                    PermissionKey::new(row.permission_key)?,
                    OverrideType::from_transport(row.override_type.as_str())?,
                ))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(OverrideSet::from_entries(entries))
    }

    async fn replace_overrides(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        branch_id: BranchId,
        overrides: &OverrideSet,
    ) -> AppResult<()> {
        let (keys, types): (Vec<String>, Vec<String>) = overrides
            .iter()
            .map(|(key, override_type)| {
                (key.as_str().to_owned(), override_type.as_str().to_owned())
            })
            .unzip();

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let pruned = sqlx::query(
            r#"
            DELETE FROM user_permission_overrides
            WHERE brand_id = $1
                AND user_id = $2
                AND branch_id = $3
                AND NOT (permission_key = ANY($4::TEXT[]))
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(branch_id.as_uuid())
        .bind(keys.as_slice())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to prune overrides: {error}")))?
        .rows_affected();

        if !keys.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO user_permission_overrides (
                    brand_id,
                    user_id,
                    branch_id,
                    permission_key,
                    override_type
                )
                SELECT $1, $2, $3, desired.key, desired.override_type
                FROM UNNEST($4::TEXT[], $5::TEXT[]) AS desired (key, override_type)
                ON CONFLICT (user_id, branch_id, permission_key)
                DO UPDATE SET
                    override_type = EXCLUDED.override_type,
                    updated_at = now()
                WHERE user_permission_overrides.override_type <> EXCLUDED.override_type
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(user_id.as_uuid())
            .bind(branch_id.as_uuid())
            .bind(keys.as_slice())
            .bind(types.as_slice())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to upsert overrides: {error}")))?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(%user_id, %branch_id, pruned, stored = keys.len(), "overrides replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use brigada_application::OverrideRepository;
    use brigada_core::TenantId;
    use brigada_domain::{BranchId, OverrideSet, OverrideType, PermissionKey, UserId};

    use super::PostgresOverrideRepository;
    use crate::postgres_test_support::{ensure_branch, ensure_brand, test_pool};

    fn key(value: &str) -> PermissionKey {
        PermissionKey::new(value).unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn replace_overrides_stores_exactly_the_target_set() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresOverrideRepository::new(pool.clone());
        let tenant_id = TenantId::new();
        let branch_id = BranchId::new();
        let user_id = UserId::new();
        ensure_brand(&pool, tenant_id, "Override Brand").await;
        ensure_branch(&pool, tenant_id, branch_id).await;

        let initial = OverrideSet::from_entries([
            (key("void_order"), OverrideType::Grant),
            (key("manage_cash"), OverrideType::Revoke),
        ]);
        let first = repository
            .replace_overrides(tenant_id, user_id, branch_id, &initial)
            .await;
        assert!(first.is_ok());

        let target = OverrideSet::from_entries([
            (key("manage_cash"), OverrideType::Grant),
            (key("apply_discount"), OverrideType::Revoke),
        ]);
        let second = repository
            .replace_overrides(tenant_id, user_id, branch_id, &target)
            .await;
        assert!(second.is_ok());

        let stored = repository
            .list_overrides(tenant_id, user_id, branch_id)
            .await
            .unwrap_or_default();
        assert_eq!(stored, target);
    }

    #[tokio::test]
    async fn empty_replace_clears_all_overrides() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresOverrideRepository::new(pool.clone());
        let tenant_id = TenantId::new();
        let branch_id = BranchId::new();
        let user_id = UserId::new();
        ensure_brand(&pool, tenant_id, "Reset Brand").await;
        ensure_branch(&pool, tenant_id, branch_id).await;

        let seeded = OverrideSet::from_entries([(key("void_order"), OverrideType::Grant)]);
        assert!(
            repository
                .replace_overrides(tenant_id, user_id, branch_id, &seeded)
                .await
                .is_ok()
        );

        let cleared = repository
            .replace_overrides(tenant_id, user_id, branch_id, &OverrideSet::new())
            .await;

        assert!(cleared.is_ok());
        assert!(
            repository
                .list_overrides(tenant_id, user_id, branch_id)
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn overrides_are_scoped_to_their_branch() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresOverrideRepository::new(pool.clone());
        let tenant_id = TenantId::new();
        let centro = BranchId::new();
        let playa = BranchId::new();
        let user_id = UserId::new();
        ensure_brand(&pool, tenant_id, "Scoped Brand").await;
        ensure_branch(&pool, tenant_id, centro).await;
        ensure_branch(&pool, tenant_id, playa).await;

        let centro_overrides =
            OverrideSet::from_entries([(key("manage_cash"), OverrideType::Grant)]);
        assert!(
            repository
                .replace_overrides(tenant_id, user_id, centro, &centro_overrides)
                .await
                .is_ok()
        );
        assert!(
            repository
                .replace_overrides(tenant_id, user_id, playa, &OverrideSet::new())
                .await
                .is_ok()
        );

        let stored_centro = repository
            .list_overrides(tenant_id, user_id, centro)
            .await
            .unwrap_or_default();
        let stored_playa = repository
            .list_overrides(tenant_id, user_id, playa)
            .await
            .unwrap_or_default();

        assert_eq!(stored_centro, centro_overrides);
        assert!(stored_playa.is_empty());
    }
}
