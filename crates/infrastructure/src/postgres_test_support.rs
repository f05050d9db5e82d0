use brigada_core::TenantId;
use brigada_domain::{BranchId, UserId};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres permission tests: {error}");
    }

    Some(pool)
}

pub(crate) async fn ensure_brand(pool: &PgPool, tenant_id: TenantId, name: &str) {
    let insert = sqlx::query(
        r#"
        INSERT INTO brands (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(name)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

pub(crate) async fn ensure_branch(pool: &PgPool, tenant_id: TenantId, branch_id: BranchId) {
    let insert = sqlx::query(
        r#"
        INSERT INTO branches (id, brand_id, name)
        VALUES ($1, $2, 'Centro')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(branch_id.as_uuid())
    .bind(tenant_id.as_uuid())
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

pub(crate) async fn assign_branch_role(
    pool: &PgPool,
    tenant_id: TenantId,
    user_id: UserId,
    branch_id: BranchId,
    role: &str,
) {
    let insert = sqlx::query(
        r#"
        INSERT INTO staff_branch_roles (brand_id, user_id, branch_id, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, branch_id) DO UPDATE SET role = EXCLUDED.role
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(user_id.as_uuid())
    .bind(branch_id.as_uuid())
    .bind(role)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}
