use async_trait::async_trait;
use sqlx::PgPool;

use brigada_application::{AuditEvent, AuditRepository};
use brigada_core::{AppError, AppResult};

/// PostgreSQL-backed append-only log of permission administration events.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_audit_events (
                brand_id,
                subject,
                action,
                resource_type,
                resource_id,
                detail
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.tenant_id.as_uuid())
        .bind(event.subject)
        .bind(event.action.as_str())
        .bind(event.resource_type)
        .bind(event.resource_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append permission audit event: {error}"))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use brigada_application::{AuditEvent, AuditRepository};
    use brigada_core::TenantId;
    use brigada_domain::AuditAction;

    use super::PostgresAuditRepository;
    use crate::postgres_test_support::test_pool;

    #[tokio::test]
    async fn appended_event_is_persisted_with_action_label() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresAuditRepository::new(pool.clone());
        let tenant_id = TenantId::new();

        let appended = repository
            .append_event(AuditEvent {
                tenant_id,
                subject: "manager-1".to_owned(),
                action: AuditAction::PermissionOverridesReset,
                resource_type: "permission_overrides".to_owned(),
                resource_id: "user:branch".to_owned(),
                detail: None,
            })
            .await;
        assert!(appended.is_ok());

        let action = sqlx::query_scalar::<_, String>(
            "SELECT action FROM permission_audit_events WHERE brand_id = $1",
        )
        .bind(tenant_id.as_uuid())
        .fetch_one(&pool)
        .await
        .unwrap_or_default();

        assert_eq!(action, "permission.overrides.reset");
    }
}
