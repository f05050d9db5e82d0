use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod conversions;

/// Optional scope filter accepted by listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub scope: Option<String>,
}

/// API representation of a catalog entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-definition-response.ts"
)]
pub struct PermissionDefinitionResponse {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub module: String,
    pub scope: String,
    pub min_role: String,
}

/// Resolved value of one permission key.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resolved-permission-response.ts"
)]
pub struct ResolvedPermissionResponse {
    pub key: String,
    pub inherited: bool,
    pub override_state: String,
    pub effective: bool,
    pub source: String,
}

/// Configuration problem reported next to a degraded resolution.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/configuration-issue-response.ts"
)]
pub struct ConfigurationIssueResponse {
    pub kind: String,
    pub key: String,
}

/// Effective permission map of one scope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/effective-permissions-response.ts"
)]
pub struct EffectivePermissionsResponse {
    pub scope: String,
    pub permissions: Vec<ResolvedPermissionResponse>,
    pub issues: Vec<ConfigurationIssueResponse>,
}

/// One stored or requested override.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-entry.ts"
)]
pub struct OverrideEntryDto {
    pub permission_key: String,
    pub override_type: String,
}

/// Full override set to store for a (user, branch) pair.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-overrides-request.ts"
)]
pub struct SaveOverridesRequest {
    pub overrides: Vec<OverrideEntryDto>,
}

/// Override editor state of a (user, branch) pair.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-session-response.ts"
)]
pub struct OverrideSessionResponse {
    pub user_id: String,
    pub branch_id: String,
    pub overrides: Vec<OverrideEntryDto>,
    pub stale_keys: Vec<String>,
    pub permissions: EffectivePermissionsResponse,
}

/// Result of an override save or reset.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-save-response.ts"
)]
pub struct OverrideSaveResponse {
    pub saved: bool,
    pub override_count: Option<usize>,
}
