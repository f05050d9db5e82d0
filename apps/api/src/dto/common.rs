use brigada_core::AppError;
use brigada_domain::PermissionKey;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Parses a permission key sent by a client.
///
/// A malformed key can never name a catalog entry, so it is reported the same
/// way as a well-formed key that is missing from the catalog.
pub(super) fn parse_permission_key(value: String) -> Result<PermissionKey, AppError> {
    PermissionKey::new(value.as_str()).map_err(|_| AppError::UnknownPermission(value))
}
