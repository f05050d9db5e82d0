use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use brigada_application::{PermissionCatalogRepository, RoleDefaultsRepository};
use brigada_core::{AppError, AppResult};
use brigada_domain::{PermissionDefinition, PermissionKey, PermissionScope, RoleName};

/// PostgreSQL-backed catalog and role default source.
#[derive(Clone)]
pub struct PostgresPermissionCatalogRepository {
    pool: PgPool,
}

impl PostgresPermissionCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionDefinitionRow {
    key: String,
    name: String,
    description: Option<String>,
    module: String,
    scope: String,
    min_role: String,
}

impl TryFrom<PermissionDefinitionRow> for PermissionDefinition {
    type Error = AppError;

    fn try_from(row: PermissionDefinitionRow) -> Result<Self, Self::Error> {
        PermissionDefinition::new(
            row.key,
            row.name,
            row.description,
            row.module,
            PermissionScope::from_transport(row.scope.as_str())?,
            row.min_role,
        )
    }
}

#[async_trait]
impl PermissionCatalogRepository for PostgresPermissionCatalogRepository {
    async fn list_definitions(
        &self,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionDefinition>> {
        let rows = sqlx::query_as::<_, PermissionDefinitionRow>(
            r#"
            SELECT key, name, description, module, scope, min_role
            FROM permission_definitions
            WHERE ($1::TEXT IS NULL OR scope = $1)
            ORDER BY sort_order, key
            "#,
        )
        .bind(scope.map(|scope| scope.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission definitions: {error}"))
        })?;

        rows.into_iter()
            .map(PermissionDefinition::try_from)
            .collect()
    }
}

#[async_trait]
impl RoleDefaultsRepository for PostgresPermissionCatalogRepository {
    async fn list_defaults(&self, role: &RoleName) -> AppResult<BTreeSet<PermissionKey>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permission_key
            FROM role_default_permissions
            WHERE role = $1
            ORDER BY permission_key
            "#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list default permissions of role '{role}': {error}"
            ))
        })?;

        keys.into_iter().map(PermissionKey::new).collect()
    }
}
