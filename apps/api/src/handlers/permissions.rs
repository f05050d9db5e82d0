use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use brigada_application::PermissionContext;
use brigada_core::UserIdentity;
use brigada_domain::{BranchId, PermissionKey, UserId};
use uuid::Uuid;

use crate::dto::{EffectivePermissionsResponse, PermissionDefinitionResponse, ScopeQuery};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_scope;

pub async fn list_catalog_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<Vec<PermissionDefinitionResponse>>> {
    let scope = parse_scope(query.scope.as_deref())?;
    let definitions = state
        .admin_service
        .list_catalog(&user, scope)
        .await?
        .into_iter()
        .map(PermissionDefinitionResponse::from)
        .collect();

    Ok(Json(definitions))
}

pub async fn my_branch_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(branch_id): Path<Uuid>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let effective = state
        .resolution_service
        .effective_permissions(
            user.tenant_id(),
            UserId::from_uuid(user.subject()),
            PermissionContext::Branch(BranchId::from_uuid(branch_id)),
        )
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(&effective)))
}

pub async fn user_branch_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((branch_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let context = PermissionContext::Branch(BranchId::from_uuid(branch_id));
    if user_id != user.subject() {
        state
            .resolution_service
            .require_permission(&user, context, PermissionKey::MANAGE_PERMISSIONS)
            .await?;
    }

    let effective = state
        .resolution_service
        .effective_permissions(user.tenant_id(), UserId::from_uuid(user_id), context)
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(&effective)))
}

pub async fn user_brand_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    if user_id != user.subject() {
        state
            .resolution_service
            .require_permission(
                &user,
                PermissionContext::Brand,
                PermissionKey::MANAGE_TEMPLATES,
            )
            .await?;
    }

    let effective = state
        .resolution_service
        .effective_permissions(
            user.tenant_id(),
            UserId::from_uuid(user_id),
            PermissionContext::Brand,
        )
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(&effective)))
}
