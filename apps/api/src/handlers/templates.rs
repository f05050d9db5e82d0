use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use brigada_application::{BindTemplateInput, CreateTemplateInput};
use brigada_core::UserIdentity;
use brigada_domain::TemplateId;
use uuid::Uuid;

use crate::dto::{
    BindTemplateRequest, CreateTemplateRequest, SaveTemplatePermissionsRequest, ScopeQuery,
    TemplateBindingResponse, TemplateDetailResponse, TemplateResponse, TemplateSaveResponse,
    UpdateTemplateRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_scope;

pub async fn list_templates_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<Vec<TemplateResponse>>> {
    let scope = parse_scope(query.scope.as_deref())?;
    let templates = state
        .admin_service
        .list_templates(&user, scope)
        .await?
        .into_iter()
        .map(TemplateResponse::from)
        .collect();

    Ok(Json(templates))
}

pub async fn create_template_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateTemplateRequest>,
) -> ApiResult<(StatusCode, Json<TemplateResponse>)> {
    let template = state
        .admin_service
        .create_template(&user, CreateTemplateInput::try_from(payload)?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TemplateResponse::from(template)),
    ))
}

pub async fn get_template_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<Json<TemplateDetailResponse>> {
    let session = state
        .admin_service
        .open_template(&user, TemplateId::from_uuid(template_id))
        .await?;

    Ok(Json(TemplateDetailResponse::from(session)))
}

/// Activates or deactivates a template.
pub async fn update_template_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(template_id): Path<Uuid>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> ApiResult<Json<TemplateResponse>> {
    let template = state
        .admin_service
        .set_template_active(&user, TemplateId::from_uuid(template_id), payload.is_active)
        .await?;

    Ok(Json(TemplateResponse::from(template)))
}

/// Replaces the template permission set with the submitted one.
pub async fn save_template_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(template_id): Path<Uuid>,
    Json(payload): Json<SaveTemplatePermissionsRequest>,
) -> ApiResult<Json<TemplateSaveResponse>> {
    let permissions = payload.into_keys()?;
    let mut session = state
        .admin_service
        .open_template(&user, TemplateId::from_uuid(template_id))
        .await?;
    session.draft.set_working(permissions);

    let outcome = state
        .admin_service
        .save_template(&user, &mut session.draft)
        .await?;

    Ok(Json(TemplateSaveResponse::from(outcome)))
}

pub async fn list_bindings_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<TemplateBindingResponse>>> {
    let bindings = state
        .admin_service
        .list_bindings(&user)
        .await?
        .into_iter()
        .map(TemplateBindingResponse::from)
        .collect();

    Ok(Json(bindings))
}

pub async fn bind_template_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<BindTemplateRequest>,
) -> ApiResult<StatusCode> {
    state
        .admin_service
        .bind_template(&user, BindTemplateInput::try_from(payload)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
