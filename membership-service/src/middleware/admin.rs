//! Shared-key guard for the admin surface.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::AppState;
use service_core::error::AppError;

const ADMIN_KEY_HEADER: &str = "x-admin-api-key";

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing admin API key")))?;

    let expected = state.config.security.admin_api_key.as_bytes();
    if !bool::from(presented.as_bytes().ct_eq(expected)) {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid admin API key"
        )));
    }

    Ok(next.run(request).await)
}
