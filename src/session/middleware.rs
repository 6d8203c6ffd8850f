use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use super::cookie::{get_cookie, SESSION_COOKIE};
use super::types::AuthenticatedUser;
use crate::middleware::RequestContext;
use crate::shared::{AppError, AppState};

/// Session authentication middleware - validates the `token` cookie and adds
/// the caller's identity to the request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::require_session))
/// Handlers can then extract `AuthenticatedUser`.
#[instrument(skip(state, req, next))]
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    info!(
        "Session authentication middleware triggered for request {}",
        req.uri()
    );

    let token = get_cookie(req.headers(), SESSION_COOKIE).ok_or_else(|| {
        warn!("Missing session cookie in request");
        AppError::Unauthorized("missing session token".to_string())
    })?;

    // Signature, parse and expiry failures look the same to the client
    let claims = state.tokens.validate(token).map_err(|e| {
        warn!(reason = %e, "Session authentication failed");
        AppError::Unauthorized("invalid or expired token".to_string())
    })?;

    info!(
        username = %claims.username,
        user_id = %claims.user_id,
        "Authentication successful, adding identity to request"
    );

    let user = AuthenticatedUser::from(claims);
    if let Some(context) = req.extensions_mut().get_mut::<RequestContext>() {
        context.user_id = Some(user.user_id.clone());
    }
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("missing session token".to_string()))
    }
}
