//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_permission_repository;
mod postgres_audit_repository;
mod postgres_override_repository;
mod postgres_permission_catalog_repository;
mod postgres_staff_role_repository;
mod postgres_template_repository;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_permission_repository::InMemoryPermissionRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_override_repository::PostgresOverrideRepository;
pub use postgres_permission_catalog_repository::PostgresPermissionCatalogRepository;
pub use postgres_staff_role_repository::PostgresStaffRoleRepository;
pub use postgres_template_repository::PostgresTemplateRepository;
