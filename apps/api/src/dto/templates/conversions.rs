use std::collections::BTreeSet;

use brigada_application::{
    BindTemplateInput, CreateTemplateInput, TemplateEditSession, TemplateSaveOutcome,
};
use brigada_core::AppError;
use brigada_domain::{
    PermissionKey, PermissionScope, PermissionTemplate, RoleName, TemplateBinding, TemplateId,
};
use uuid::Uuid;

use super::{
    BindTemplateRequest, CreateTemplateRequest, SaveTemplatePermissionsRequest,
    TemplateBindingResponse, TemplateDetailResponse, TemplateResponse, TemplateSaveResponse,
};
use crate::dto::common::parse_permission_key;

impl SaveTemplatePermissionsRequest {
    /// Parses the requested permission keys.
    pub fn into_keys(self) -> Result<BTreeSet<PermissionKey>, AppError> {
        parse_permission_keys(self.permissions)
    }
}

impl From<PermissionTemplate> for TemplateResponse {
    fn from(value: PermissionTemplate) -> Self {
        Self {
            template_id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            scope: value.scope().as_str().to_owned(),
            is_active: value.is_active(),
        }
    }
}

impl From<TemplateEditSession> for TemplateDetailResponse {
    fn from(value: TemplateEditSession) -> Self {
        Self {
            permissions: key_strings(value.draft.original()),
            stale_keys: key_strings(&value.stale_keys),
            template: TemplateResponse::from(value.template),
        }
    }
}

impl From<TemplateSaveOutcome> for TemplateSaveResponse {
    fn from(value: TemplateSaveOutcome) -> Self {
        match value {
            TemplateSaveOutcome::NoChanges => Self {
                saved: false,
                added: Vec::new(),
                removed: Vec::new(),
            },
            TemplateSaveOutcome::Saved(changes) => Self {
                saved: true,
                added: key_strings(&changes.added),
                removed: key_strings(&changes.removed),
            },
        }
    }
}

impl From<TemplateBinding> for TemplateBindingResponse {
    fn from(value: TemplateBinding) -> Self {
        Self {
            role: value.role.as_str().to_owned(),
            scope: value.scope.as_str().to_owned(),
            template_id: value.template_id.to_string(),
        }
    }
}

impl TryFrom<CreateTemplateRequest> for CreateTemplateInput {
    type Error = AppError;

    fn try_from(value: CreateTemplateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name,
            scope: PermissionScope::from_transport(value.scope.as_str())?,
            permissions: parse_permission_keys(value.permissions)?,
        })
    }
}

impl TryFrom<BindTemplateRequest> for BindTemplateInput {
    type Error = AppError;

    fn try_from(value: BindTemplateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            role: RoleName::new(value.role)?,
            scope: PermissionScope::from_transport(value.scope.as_str())?,
            template_id: value
                .template_id
                .as_deref()
                .map(parse_template_id)
                .transpose()?,
        })
    }
}

fn parse_permission_keys(values: Vec<String>) -> Result<BTreeSet<PermissionKey>, AppError> {
    values.into_iter().map(parse_permission_key).collect()
}

fn parse_template_id(value: &str) -> Result<TemplateId, AppError> {
    Uuid::parse_str(value.trim())
        .map(TemplateId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid template id '{value}': {error}")))
}

fn key_strings(keys: &BTreeSet<PermissionKey>) -> Vec<String> {
    keys.iter().map(|key| key.as_str().to_owned()).collect()
}
