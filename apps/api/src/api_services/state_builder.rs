use std::sync::Arc;

use brigada_application::{
    PermissionAdminService, PermissionRepositories, PermissionResolutionService,
};
use brigada_infrastructure::{
    PostgresAuditRepository, PostgresOverrideRepository, PostgresPermissionCatalogRepository,
    PostgresStaffRoleRepository, PostgresTemplateRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let catalog_repository = Arc::new(PostgresPermissionCatalogRepository::new(pool.clone()));
    let repositories = PermissionRepositories {
        catalog: catalog_repository.clone(),
        role_defaults: catalog_repository,
        templates: Arc::new(PostgresTemplateRepository::new(pool.clone())),
        overrides: Arc::new(PostgresOverrideRepository::new(pool.clone())),
        staff_roles: Arc::new(PostgresStaffRoleRepository::new(pool.clone())),
    };
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool));

    let resolution_service = PermissionResolutionService::new(repositories.clone());
    let admin_service = PermissionAdminService::new(
        resolution_service.clone(),
        repositories,
        audit_repository,
    );

    AppState::new(
        resolution_service,
        admin_service,
        config.gateway_shared_secret.clone(),
    )
}
