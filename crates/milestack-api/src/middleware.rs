use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{AppState, decode_token};
use crate::error::ApiError;

/// Extract and validate the bearer token, then attach the decoded claims to
/// the request so handlers can read the caller's identity.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return Err(ApiError::Unauthenticated(
            "Authorization header missing or malformed".into(),
        ));
    };

    let claims = decode_token(&state.auth.jwt_secret, token.trim())
        .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
