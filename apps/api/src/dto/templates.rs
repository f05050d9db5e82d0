use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod conversions;

/// Incoming payload for template creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-template-request.ts"
)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub scope: String,
    pub permissions: Vec<String>,
}

/// Full permission set to store in a template.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-template-permissions-request.ts"
)]
pub struct SaveTemplatePermissionsRequest {
    pub permissions: Vec<String>,
}

/// Incoming payload for changing a template header.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-template-request.ts"
)]
pub struct UpdateTemplateRequest {
    pub is_active: bool,
}

/// Incoming payload for binding a template to a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bind-template-request.ts"
)]
pub struct BindTemplateRequest {
    pub role: String,
    pub scope: String,
    pub template_id: Option<String>,
}

/// API representation of a template header.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/template-response.ts"
)]
pub struct TemplateResponse {
    pub template_id: String,
    pub name: String,
    pub scope: String,
    pub is_active: bool,
}

/// Template editor state.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/template-detail-response.ts"
)]
pub struct TemplateDetailResponse {
    pub template: TemplateResponse,
    pub permissions: Vec<String>,
    pub stale_keys: Vec<String>,
}

/// Result of a template save.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/template-save-response.ts"
)]
pub struct TemplateSaveResponse {
    pub saved: bool,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// API representation of a role binding.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/template-binding-response.ts"
)]
pub struct TemplateBindingResponse {
    pub role: String,
    pub scope: String,
    pub template_id: String,
}
