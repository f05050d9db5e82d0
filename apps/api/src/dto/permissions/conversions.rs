use std::collections::BTreeSet;

use brigada_application::{OverrideEditSession, OverrideSaveOutcome};
use brigada_core::AppError;
use brigada_domain::{
    ConfigurationIssue, EffectivePermissions, OverrideSet, OverrideType, PermissionDefinition,
};

use super::{
    ConfigurationIssueResponse, EffectivePermissionsResponse, OverrideEntryDto,
    OverrideSaveResponse, OverrideSessionResponse, PermissionDefinitionResponse,
    ResolvedPermissionResponse, SaveOverridesRequest,
};
use crate::dto::common::parse_permission_key;

impl From<PermissionDefinition> for PermissionDefinitionResponse {
    fn from(value: PermissionDefinition) -> Self {
        Self {
            key: value.key().as_str().to_owned(),
            name: value.name().as_str().to_owned(),
            description: value.description().map(ToOwned::to_owned),
            module: value.module().to_owned(),
            scope: value.scope().as_str().to_owned(),
            min_role: value.min_role().as_str().to_owned(),
        }
    }
}

impl From<&ConfigurationIssue> for ConfigurationIssueResponse {
    fn from(value: &ConfigurationIssue) -> Self {
        let (kind, key) = match value {
            ConfigurationIssue::TemplateScopeMismatch { key, .. } => {
                ("template_scope_mismatch", key)
            }
            ConfigurationIssue::OverrideOnBrandPermission { key } => {
                ("override_on_brand_permission", key)
            }
            ConfigurationIssue::UnknownOverrideKey { key } => ("unknown_override_key", key),
        };

        Self {
            kind: kind.to_owned(),
            key: key.as_str().to_owned(),
        }
    }
}

impl From<&EffectivePermissions> for EffectivePermissionsResponse {
    fn from(value: &EffectivePermissions) -> Self {
        Self {
            scope: value.scope().as_str().to_owned(),
            permissions: value
                .iter()
                .map(|(key, resolved)| ResolvedPermissionResponse {
                    key: key.as_str().to_owned(),
                    inherited: resolved.inherited,
                    override_state: resolved
                        .override_state
                        .override_type()
                        .map_or("inherited", |override_type| override_type.as_str())
                        .to_owned(),
                    effective: resolved.effective,
                    source: resolved.source.as_str().to_owned(),
                })
                .collect(),
            issues: value
                .issues()
                .iter()
                .map(ConfigurationIssueResponse::from)
                .collect(),
        }
    }
}

impl From<OverrideEditSession> for OverrideSessionResponse {
    fn from(value: OverrideEditSession) -> Self {
        Self {
            user_id: value.draft.user_id().to_string(),
            branch_id: value.draft.branch_id().to_string(),
            overrides: override_entries(value.draft.original()),
            stale_keys: value
                .stale_keys
                .iter()
                .map(|key| key.as_str().to_owned())
                .collect(),
            permissions: EffectivePermissionsResponse::from(&value.effective),
        }
    }
}

impl From<OverrideSaveOutcome> for OverrideSaveResponse {
    fn from(value: OverrideSaveOutcome) -> Self {
        match value {
            OverrideSaveOutcome::NoChanges => Self {
                saved: false,
                override_count: None,
            },
            OverrideSaveOutcome::Saved { override_count } => Self {
                saved: true,
                override_count: Some(override_count),
            },
        }
    }
}

impl TryFrom<SaveOverridesRequest> for OverrideSet {
    type Error = AppError;

    fn try_from(value: SaveOverridesRequest) -> Result<Self, Self::Error> {
        let mut seen = BTreeSet::new();
        let mut entries = Vec::with_capacity(value.overrides.len());

        for entry in value.overrides {
            let key = parse_permission_key(entry.permission_key)?;
            if !seen.insert(key.clone()) {
                return Err(AppError::Validation(format!(
                    "permission '{key}' is listed more than once"
                )));
            }
            let override_type = OverrideType::from_transport(entry.override_type.as_str())?;
            entries.push((key, override_type));
        }

        Ok(OverrideSet::from_entries(entries))
    }
}

fn override_entries(overrides: &OverrideSet) -> Vec<OverrideEntryDto> {
    overrides
        .iter()
        .map(|(key, override_type)| OverrideEntryDto {
            permission_key: key.as_str().to_owned(),
            override_type: override_type.as_str().to_owned(),
        })
        .collect()
}
