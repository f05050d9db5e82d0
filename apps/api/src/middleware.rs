use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use brigada_core::{AppError, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

const GATEWAY_TOKEN_HEADER: &str = "x-brigada-gateway-token";
const SUBJECT_HEADER: &str = "x-brigada-subject";
const TENANT_HEADER: &str = "x-brigada-tenant";
const DISPLAY_NAME_HEADER: &str = "x-brigada-display-name";

pub async fn require_gateway_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers(), &state.gateway_shared_secret)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn identity_from_headers(
    headers: &HeaderMap,
    shared_secret: &str,
) -> Result<UserIdentity, AppError> {
    let token = header_value(headers, GATEWAY_TOKEN_HEADER)
        .ok_or_else(|| AppError::Unauthorized("gateway token is required".to_owned()))?;
    if !constant_time_eq(token.as_bytes(), shared_secret.as_bytes()) {
        return Err(AppError::Unauthorized("invalid gateway token".to_owned()));
    }

    let subject = header_value(headers, SUBJECT_HEADER)
        .ok_or_else(|| AppError::Unauthorized("subject header is required".to_owned()))?;
    let tenant = header_value(headers, TENANT_HEADER)
        .ok_or_else(|| AppError::Unauthorized("tenant header is required".to_owned()))?;

    UserIdentity::from_transport(subject, header_value(headers, DISPLAY_NAME_HEADER), tenant)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let mut difference = 0_u8;
    for (left, right) in left.iter().zip(right) {
        difference |= left ^ right;
    }

    difference == 0
}
