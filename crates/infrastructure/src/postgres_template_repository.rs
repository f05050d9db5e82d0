use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use brigada_application::{BindTemplateInput, CreateTemplateInput, TemplateRepository};
use brigada_core::{AppError, AppResult, TenantId};
use brigada_domain::{
    PermissionKey, PermissionScope, PermissionTemplate, RoleName, TemplateBinding, TemplateId,
};


/// PostgreSQL-backed store for permission templates and role bindings.
#[derive(Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    scope: String,
    is_active: bool,
}

impl TryFrom<TemplateRow> for PermissionTemplate {
    type Error = AppError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        PermissionTemplate::new(
            TemplateId::from_uuid(row.id),
            row.name,
            PermissionScope::from_transport(row.scope.as_str())?,
            row.is_active,
        )
    }
}

#[derive(Debug, FromRow)]
struct BindingRow {
    role: String,
    scope: String,
    template_id: Uuid,
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn list_templates(
        &self,
        tenant_id: TenantId,
        scope: Option<PermissionScope>,
    ) -> AppResult<Vec<PermissionTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, name, scope, is_active
            FROM permission_templates
            WHERE brand_id = $1
                AND ($2::TEXT IS NULL OR scope = $2)
            ORDER BY scope, name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(scope.map(|scope| scope.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list templates: {error}")))?;

        rows.into_iter().map(PermissionTemplate::try_from).collect()
    }

    async fn find_template(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<Option<PermissionTemplate>> {
        sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, name, scope, is_active
            FROM permission_templates
            WHERE brand_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(template_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find template: {error}")))?
        .map(PermissionTemplate::try_from)
        .transpose()
    }

    async fn template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> AppResult<BTreeSet<PermissionKey>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permissions.permission_key
            FROM template_permissions AS permissions
            INNER JOIN permission_templates AS templates
                ON templates.id = permissions.template_id
            WHERE templates.brand_id = $1
                AND templates.id = $2
            ORDER BY permissions.permission_key
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(template_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list template permissions: {error}"))
        })?;

        keys.into_iter().map(PermissionKey::new).collect()
    }

    async fn create_template(
        &self,
        tenant_id: TenantId,
        input: CreateTemplateInput,
    ) -> AppResult<PermissionTemplate> {
        let template_id = TemplateId::new();
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO permission_templates (id, brand_id, name, scope, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            "#,
        )
        .bind(template_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(input.name.as_str())
        .bind(input.scope.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_template_conflict(error, input.name.as_str()))?;

        insert_template_keys(&mut transaction, template_id, &input.permissions).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        PermissionTemplate::new(template_id, input.name, input.scope, true)
    }

    async fn replace_template_permissions(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        permissions: &BTreeSet<PermissionKey>,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let exists = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM permission_templates
            WHERE brand_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(template_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock template: {error}")))?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!(
                "template '{template_id}' does not exist"
            )));
        }

        let desired = key_strings(permissions);
        let pruned = sqlx::query(
            r#"
            DELETE FROM template_permissions
            WHERE template_id = $1
                AND NOT (permission_key = ANY($2::TEXT[]))
            "#,
        )
        .bind(template_id.as_uuid())
        .bind(desired.as_slice())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to prune template permissions: {error}"))
        })?
        .rows_affected();

        insert_template_keys(&mut transaction, template_id, permissions).await?;

        sqlx::query(
            r#"
            UPDATE permission_templates
            SET updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(template_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to touch template: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(%template_id, pruned, kept = desired.len(), "template permissions replaced");
        Ok(())
    }

    async fn set_template_active(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
        is_active: bool,
    ) -> AppResult<PermissionTemplate> {
        sqlx::query_as::<_, TemplateRow>(
            r#"
            UPDATE permission_templates
            SET is_active = $3, updated_at = now()
            WHERE brand_id = $1 AND id = $2
            RETURNING id, name, scope, is_active
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(template_id.as_uuid())
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update template activation: {error}"))
        })?
        .map(PermissionTemplate::try_from)
        .transpose()?
        .ok_or_else(|| AppError::NotFound(format!("template '{template_id}' does not exist")))
    }

    async fn find_bound_template(
        &self,
        tenant_id: TenantId,
        role: &RoleName,
        scope: PermissionScope,
    ) -> AppResult<Option<TemplateId>> {
        let template_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT template_id
            FROM template_bindings
            WHERE brand_id = $1 AND role = $2 AND scope = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.as_str())
        .bind(scope.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find template binding: {error}"))
        })?;

        Ok(template_id.map(TemplateId::from_uuid))
    }

    async fn bind_template(&self, tenant_id: TenantId, input: BindTemplateInput) -> AppResult<()> {
        let result = match input.template_id {
            Some(template_id) => {
                sqlx::query(
                    r#"
                    INSERT INTO template_bindings (brand_id, role, scope, template_id)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (brand_id, role, scope)
                    DO UPDATE SET template_id = EXCLUDED.template_id
                    "#,
                )
                .bind(tenant_id.as_uuid())
                .bind(input.role.as_str())
                .bind(input.scope.as_str())
                .bind(template_id.as_uuid())
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    DELETE FROM template_bindings
                    WHERE brand_id = $1 AND role = $2 AND scope = $3
                    "#,
                )
                .bind(tenant_id.as_uuid())
                .bind(input.role.as_str())
                .bind(input.scope.as_str())
                .execute(&self.pool)
                .await
            }
        };

        result.map_err(|error| map_binding_error(error, &input.role))?;
        Ok(())
    }

    async fn list_bindings(&self, tenant_id: TenantId) -> AppResult<Vec<TemplateBinding>> {
        let rows = sqlx::query_as::<_, BindingRow>(
            r#"
            SELECT role, scope, template_id
            FROM template_bindings
            WHERE brand_id = $1
            ORDER BY role, scope
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list template bindings: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(TemplateBinding {
                    role: RoleName::new(row.role)?,
                    scope: PermissionScope::from_transport(row.scope.as_str())?,
                    template_id: TemplateId::from_uuid(row.template_id),
                })
            })
            .collect()
    }
}

async fn insert_template_keys(
    transaction: &mut Transaction<'_, Postgres>,
    template_id: TemplateId,
    permissions: &BTreeSet<PermissionKey>,
) -> AppResult<()> {
    if permissions.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO template_permissions (template_id, permission_key)
        SELECT $1, key
        FROM UNNEST($2::TEXT[]) AS desired (key)
        ON CONFLICT (template_id, permission_key) DO NOTHING
        "#,
    )
    .bind(template_id.as_uuid())
    .bind(key_strings(permissions))
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to persist template permissions: {error}"))
    })?;

    Ok(())
}

fn key_strings(permissions: &BTreeSet<PermissionKey>) -> Vec<String> {
    permissions
        .iter()
        .map(|key| key.as_str().to_owned())
        .collect()
}

fn map_template_conflict(error: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("template '{name}' already exists"));
    }

    AppError::Internal(format!("failed to create template: {error}"))
}

fn map_binding_error(error: sqlx::Error, role: &RoleName) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!("role '{role}' or template does not exist"));
    }

    AppError::Internal(format!("failed to bind template: {error}"))
}
