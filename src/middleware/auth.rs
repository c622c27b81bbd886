use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{bearer_token, AuthError, AuthUser};
use crate::error::ApiError;

/// JWT authentication middleware that validates tokens and extracts user context.
///
/// Rejects with 401 before the handler runs; on success the [`AuthUser`] is
/// available to handlers as an `Extension`.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers())?.ok_or(AuthError::MissingHeader)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Like [`jwt_auth_middleware`] but lets requests without credentials through.
///
/// A credential that is present must still be valid.
pub async fn optional_jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = authenticate(&state, request.headers())? {
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

/// `Ok(None)` when no Authorization header was sent
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Option<AuthUser>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("Invalid Authorization header format"))?;
    let token = bearer_token(value)?;

    match state.verifier.verify(token) {
        Ok(user) => Ok(Some(user)),
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            Err(e)
        }
    }
}
