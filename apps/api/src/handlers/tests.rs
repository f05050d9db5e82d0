use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use brigada_application::{PermissionAdminService, PermissionResolutionService};
use brigada_core::{AppError, TenantId, UserIdentity};
use brigada_domain::{
    BranchId, PermissionDefinition, PermissionKey, PermissionScope, RoleName, UserId,
};
use brigada_infrastructure::InMemoryPermissionRepository;
use uuid::Uuid;

use super::{overrides, permissions, templates};
use crate::dto::{
    BindTemplateRequest, CreateTemplateRequest, EffectivePermissionsResponse, SaveOverridesRequest,
    SaveTemplatePermissionsRequest, ScopeQuery, UpdateTemplateRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

const LOCAL_KEYS: [(&str, &str); 5] = [
    ("view_orders", "pos"),
    ("create_order", "pos"),
    ("void_order", "pos"),
    ("manage_cash", "pos"),
    ("manage_permissions", "staff"),
];
const BRAND_KEYS: [(&str, &str); 2] = [("manage_menu", "menu"), ("manage_templates", "staff")];

struct Harness {
    state: AppState,
    store: Arc<InMemoryPermissionRepository>,
    branch_id: Uuid,
    manager: UserIdentity,
    owner: UserIdentity,
    cashier: UserIdentity,
}

fn key(value: &str) -> PermissionKey {
    PermissionKey::new(value).unwrap_or_else(|_| unreachable!())
}

fn role(value: &str) -> RoleName {
    RoleName::new(value).unwrap_or_else(|_| unreachable!())
}

fn actor(tenant_id: TenantId) -> UserIdentity {
    UserIdentity::new(Uuid::new_v4(), None, tenant_id)
}

fn overrides_request(entries: &[(&str, &str)]) -> SaveOverridesRequest {
    serde_json::from_value(serde_json::json!({
        "overrides": entries
            .iter()
            .map(|(permission_key, override_type)| serde_json::json!({
                "permission_key": permission_key,
                "override_type": override_type,
            }))
            .collect::<Vec<_>>(),
    }))
    .unwrap_or_else(|_| unreachable!())
}

fn granted(response: &EffectivePermissionsResponse, permission_key: &str) -> bool {
    response
        .permissions
        .iter()
        .any(|permission| permission.key == permission_key && permission.effective)
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryPermissionRepository::new());
    for (value, module) in LOCAL_KEYS {
        store
            .insert_definition(
                PermissionDefinition::new(
                    value,
                    value,
                    None,
                    module,
                    PermissionScope::Local,
                    "cajero",
                )
                .unwrap_or_else(|_| unreachable!()),
            )
            .await;
    }
    for (value, module) in BRAND_KEYS {
        store
            .insert_definition(
                PermissionDefinition::new(
                    value,
                    value,
                    None,
                    module,
                    PermissionScope::Brand,
                    "franquiciado",
                )
                .unwrap_or_else(|_| unreachable!()),
            )
            .await;
    }
    store
        .set_role_defaults(
            role("cajero"),
            [key("view_orders"), key("create_order")].into(),
        )
        .await;
    store
        .set_role_defaults(
            role("encargado"),
            LOCAL_KEYS.iter().map(|(value, _)| key(value)).collect(),
        )
        .await;
    store
        .set_role_defaults(
            role("franquiciado"),
            BRAND_KEYS.iter().map(|(value, _)| key(value)).collect(),
        )
        .await;

    let tenant_id = TenantId::new();
    let branch_id = Uuid::new_v4();
    let manager = actor(tenant_id);
    let owner = actor(tenant_id);
    let cashier = actor(tenant_id);
    store
        .assign_branch_role(
            tenant_id,
            UserId::from_uuid(manager.subject()),
            BranchId::from_uuid(branch_id),
            role("encargado"),
        )
        .await;
    store
        .assign_branch_role(
            tenant_id,
            UserId::from_uuid(cashier.subject()),
            BranchId::from_uuid(branch_id),
            role("cajero"),
        )
        .await;
    store
        .assign_brand_role(
            tenant_id,
            UserId::from_uuid(owner.subject()),
            role("franquiciado"),
        )
        .await;

    let resolution_service = PermissionResolutionService::new(store.repositories());
    let admin_service = PermissionAdminService::new(
        resolution_service.clone(),
        store.repositories(),
        store.clone(),
    );
    let state = AppState::new(
        resolution_service,
        admin_service,
        "0123456789abcdef0123456789abcdef".to_owned(),
    );

    Harness {
        state,
        store,
        branch_id,
        manager,
        owner,
        cashier,
    }
}

async fn cashier_permissions(harness: &Harness) -> EffectivePermissionsResponse {
    let Json(response) = permissions::my_branch_permissions_handler(
        State(harness.state.clone()),
        Extension(harness.cashier.clone()),
        Path(harness.branch_id),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    response
}

#[tokio::test]
async fn catalog_can_be_filtered_by_scope() {
    let harness = harness().await;

    let result = permissions::list_catalog_handler(
        State(harness.state.clone()),
        Extension(harness.cashier.clone()),
        Query(ScopeQuery {
            scope: Some("brand".to_owned()),
        }),
    )
    .await;

    let Json(definitions) = result.unwrap_or_else(|_| unreachable!());
    assert_eq!(definitions.len(), BRAND_KEYS.len());
    assert!(
        definitions
            .iter()
            .all(|definition| definition.scope == "brand")
    );
}

#[tokio::test]
async fn unknown_scope_filter_is_rejected() {
    let harness = harness().await;

    let result = permissions::list_catalog_handler(
        State(harness.state.clone()),
        Extension(harness.cashier.clone()),
        Query(ScopeQuery {
            scope: Some("galaxy".to_owned()),
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn manager_override_save_replaces_cashier_permissions() {
    let harness = harness().await;

    let result = overrides::save_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path((harness.branch_id, harness.cashier.subject())),
        Json(overrides_request(&[
            ("void_order", "grant"),
            ("create_order", "revoke"),
        ])),
    )
    .await;

    let Json(outcome) = result.unwrap_or_else(|_| unreachable!());
    assert!(outcome.saved);
    assert_eq!(outcome.override_count, Some(2));

    let effective = cashier_permissions(&harness).await;
    assert!(granted(&effective, "view_orders"));
    assert!(granted(&effective, "void_order"));
    assert!(!granted(&effective, "create_order"));
    assert_eq!(harness.store.audit_events().await.len(), 1);
}

#[tokio::test]
async fn unknown_override_key_is_rejected_before_writing() {
    let harness = harness().await;

    let result = overrides::save_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path((harness.branch_id, harness.cashier.subject())),
        Json(overrides_request(&[
            ("void_order", "grant"),
            ("launch_rocket", "grant"),
        ])),
    )
    .await;

    assert!(matches!(
        result,
        Err(ApiError(AppError::UnknownPermission(_)))
    ));
    let effective = cashier_permissions(&harness).await;
    assert!(!granted(&effective, "void_order"));
    assert!(harness.store.audit_events().await.is_empty());
}

#[tokio::test]
async fn preview_does_not_persist_overrides() {
    let harness = harness().await;

    let result = overrides::preview_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path((harness.branch_id, harness.cashier.subject())),
        Json(overrides_request(&[("manage_cash", "grant")])),
    )
    .await;

    let Json(preview) = result.unwrap_or_else(|_| unreachable!());
    assert!(granted(&preview, "manage_cash"));
    let stored = cashier_permissions(&harness).await;
    assert!(!granted(&stored, "manage_cash"));
}

#[tokio::test]
async fn reset_clears_overrides_once() {
    let harness = harness().await;
    let path = (harness.branch_id, harness.cashier.subject());
    let saved = overrides::save_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path(path),
        Json(overrides_request(&[("view_orders", "revoke")])),
    )
    .await;
    assert!(saved.is_ok());

    let first = overrides::reset_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path(path),
    )
    .await
    .map(|Json(response)| response.saved);
    let second = overrides::reset_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path(path),
    )
    .await
    .map(|Json(response)| response.saved);

    assert!(matches!(first, Ok(true)));
    assert!(matches!(second, Ok(false)));
    assert!(granted(&cashier_permissions(&harness).await, "view_orders"));
}

#[tokio::test]
async fn cashier_cannot_read_or_edit_other_users() {
    let harness = harness().await;

    let read = permissions::user_branch_permissions_handler(
        State(harness.state.clone()),
        Extension(harness.cashier.clone()),
        Path((harness.branch_id, harness.manager.subject())),
    )
    .await;
    let edit = overrides::get_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.cashier.clone()),
        Path((harness.branch_id, harness.manager.subject())),
    )
    .await;

    assert!(matches!(read, Err(ApiError(AppError::Forbidden(_)))));
    assert!(matches!(edit, Err(ApiError(AppError::Forbidden(_)))));
}

#[tokio::test]
async fn owner_template_binding_replaces_role_defaults() {
    let harness = harness().await;

    let created = templates::create_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Json(CreateTemplateRequest {
            name: "Caja rapida".to_owned(),
            scope: "local".to_owned(),
            permissions: vec!["view_orders".to_owned()],
        }),
    )
    .await;
    let (status, Json(template)) = created.unwrap_or_else(|_| unreachable!());
    assert_eq!(status, StatusCode::CREATED);
    let template_id =
        Uuid::parse_str(template.template_id.as_str()).unwrap_or_else(|_| unreachable!());

    let saved = templates::save_template_permissions_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Path(template_id),
        Json(SaveTemplatePermissionsRequest {
            permissions: vec!["view_orders".to_owned(), "manage_cash".to_owned()],
        }),
    )
    .await;
    let Json(saved) = saved.unwrap_or_else(|_| unreachable!());
    assert!(saved.saved);
    assert_eq!(saved.added, vec!["manage_cash".to_owned()]);

    let bound = templates::bind_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Json(BindTemplateRequest {
            role: "cajero".to_owned(),
            scope: "local".to_owned(),
            template_id: Some(template_id.to_string()),
        }),
    )
    .await;
    assert!(matches!(bound, Ok(StatusCode::NO_CONTENT)));

    let effective = cashier_permissions(&harness).await;
    assert!(granted(&effective, "view_orders"));
    assert!(granted(&effective, "manage_cash"));
    assert!(!granted(&effective, "create_order"));

    let Json(bindings) = templates::list_bindings_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(bindings.len(), 1);
}

#[tokio::test]
async fn template_detail_flags_keys_removed_from_catalog() {
    let harness = harness().await;
    let created = templates::create_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Json(CreateTemplateRequest {
            name: "Encargado noche".to_owned(),
            scope: "local".to_owned(),
            permissions: vec!["void_order".to_owned(), "manage_cash".to_owned()],
        }),
    )
    .await;
    let (_, Json(template)) = created.unwrap_or_else(|_| unreachable!());
    harness.store.remove_definition(&key("void_order")).await;
    let template_id =
        Uuid::parse_str(template.template_id.as_str()).unwrap_or_else(|_| unreachable!());

    let detail = templates::get_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Path(template_id),
    )
    .await;

    let Json(detail) = detail.unwrap_or_else(|_| unreachable!());
    assert_eq!(detail.permissions, vec!["manage_cash".to_owned()]);
    assert_eq!(detail.stale_keys, vec!["void_order".to_owned()]);
}

#[tokio::test]
async fn deactivated_template_stops_applying_to_bound_role() {
    let harness = harness().await;
    let created = templates::create_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Json(CreateTemplateRequest {
            name: "Solo caja".to_owned(),
            scope: "local".to_owned(),
            permissions: vec!["manage_cash".to_owned()],
        }),
    )
    .await;
    let (_, Json(template)) = created.unwrap_or_else(|_| unreachable!());
    let template_id =
        Uuid::parse_str(template.template_id.as_str()).unwrap_or_else(|_| unreachable!());
    let bound = templates::bind_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Json(BindTemplateRequest {
            role: "cajero".to_owned(),
            scope: "local".to_owned(),
            template_id: Some(template_id.to_string()),
        }),
    )
    .await;
    assert!(bound.is_ok());
    let templated = cashier_permissions(&harness).await;
    assert!(!granted(&templated, "view_orders"));

    let updated = templates::update_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Path(template_id),
        Json(UpdateTemplateRequest { is_active: false }),
    )
    .await;

    let Json(updated) = updated.unwrap_or_else(|_| unreachable!());
    assert!(!updated.is_active);
    let effective = cashier_permissions(&harness).await;
    assert!(granted(&effective, "view_orders"));
    assert!(granted(&effective, "create_order"));
    assert!(!granted(&effective, "manage_cash"));
}

#[tokio::test]
async fn manager_cannot_deactivate_templates() {
    let harness = harness().await;
    let created = templates::create_template_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Json(CreateTemplateRequest {
            name: "Barra".to_owned(),
            scope: "local".to_owned(),
            permissions: vec!["view_orders".to_owned()],
        }),
    )
    .await;
    let (_, Json(template)) = created.unwrap_or_else(|_| unreachable!());
    let template_id =
        Uuid::parse_str(template.template_id.as_str()).unwrap_or_else(|_| unreachable!());

    let result = templates::update_template_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path(template_id),
        Json(UpdateTemplateRequest { is_active: false }),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Forbidden(_)))));
}

#[tokio::test]
async fn malformed_override_key_is_an_unknown_permission() {
    let harness = harness().await;

    let result = overrides::save_overrides_handler(
        State(harness.state.clone()),
        Extension(harness.manager.clone()),
        Path((harness.branch_id, harness.cashier.subject())),
        Json(overrides_request(&[("Fly-Drone", "grant")])),
    )
    .await;

    assert!(matches!(
        result,
        Err(ApiError(AppError::UnknownPermission(_)))
    ));
    assert!(harness.store.audit_events().await.is_empty());
}

#[tokio::test]
async fn cashier_cannot_manage_templates() {
    let harness = harness().await;

    let result = templates::list_templates_handler(
        State(harness.state.clone()),
        Extension(harness.cashier.clone()),
        Query(ScopeQuery::default()),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Forbidden(_)))));
}

#[tokio::test]
async fn brand_permissions_of_self_are_readable() {
    let harness = harness().await;

    let result = permissions::user_brand_permissions_handler(
        State(harness.state.clone()),
        Extension(harness.owner.clone()),
        Path(harness.owner.subject()),
    )
    .await;

    let Json(effective) = result.unwrap_or_else(|_| unreachable!());
    assert_eq!(effective.scope, "brand");
    assert!(granted(&effective, "manage_menu"));
    let keys: BTreeSet<&str> = effective
        .permissions
        .iter()
        .map(|permission| permission.key.as_str())
        .collect();
    assert!(!keys.contains("view_orders"));
}
