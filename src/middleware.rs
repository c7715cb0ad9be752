use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    app_error::AppError,
    app_state::AppState,
    auth::AuthUser,
};

/// Rejects requests without a valid bearer token and exposes the caller as an
/// `Extension<AuthUser>` to downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or_else(|| {
        tracing::warn!(path = %req.uri().path(), "missing bearer token");
        AppError::Unauthorized("Authentication required".into())
    })?;

    let claims = state.jwt.verify(token).map_err(|err| {
        tracing::warn!(path = %req.uri().path(), %err, "token validation failed");
        AppError::Unauthorized("Invalid Token".into())
    })?;

    let user = AuthUser::try_from(claims)
        .map_err(|err| AppError::Unauthorized(format!("Authentication error: {err}")))?;

    tracing::debug!(user_id = user.id, role = %user.role, "request authenticated");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
