mod common;
mod permissions;
mod templates;

pub use common::HealthResponse;
pub use permissions::{
    EffectivePermissionsResponse, OverrideSaveResponse, OverrideSessionResponse,
    PermissionDefinitionResponse, SaveOverridesRequest, ScopeQuery,
};
pub use templates::{
    BindTemplateRequest, CreateTemplateRequest, SaveTemplatePermissionsRequest,
    TemplateBindingResponse, TemplateDetailResponse, TemplateResponse, TemplateSaveResponse,
    UpdateTemplateRequest,
};
