use axum::Json;
use axum::extract::{Extension, Path, State};
use brigada_core::UserIdentity;
use brigada_domain::{BranchId, OverrideSet, UserId};
use uuid::Uuid;

use crate::dto::{
    EffectivePermissionsResponse, OverrideSaveResponse, OverrideSessionResponse,
    SaveOverridesRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((branch_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OverrideSessionResponse>> {
    let session = state
        .admin_service
        .open_overrides(
            &user,
            UserId::from_uuid(user_id),
            BranchId::from_uuid(branch_id),
        )
        .await?;

    Ok(Json(OverrideSessionResponse::from(session)))
}

/// Replaces the stored overrides of the pair with the submitted set.
pub async fn save_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((branch_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SaveOverridesRequest>,
) -> ApiResult<Json<OverrideSaveResponse>> {
    let target = OverrideSet::try_from(payload)?;
    let mut session = state
        .admin_service
        .open_overrides(
            &user,
            UserId::from_uuid(user_id),
            BranchId::from_uuid(branch_id),
        )
        .await?;
    session.draft.set_working(target);

    let outcome = state
        .admin_service
        .save_overrides(&user, &mut session.draft)
        .await?;

    Ok(Json(OverrideSaveResponse::from(outcome)))
}

pub async fn preview_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((branch_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SaveOverridesRequest>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let target = OverrideSet::try_from(payload)?;
    let mut session = state
        .admin_service
        .open_overrides(
            &user,
            UserId::from_uuid(user_id),
            BranchId::from_uuid(branch_id),
        )
        .await?;
    session.draft.set_working(target);

    let effective = state.admin_service.preview(&user, &session.draft).await?;

    Ok(Json(EffectivePermissionsResponse::from(&effective)))
}

pub async fn reset_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((branch_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OverrideSaveResponse>> {
    let outcome = state
        .admin_service
        .reset_overrides(
            &user,
            UserId::from_uuid(user_id),
            BranchId::from_uuid(branch_id),
        )
        .await?;

    Ok(Json(OverrideSaveResponse::from(outcome)))
}
