use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    cookie::{get_cookie, session_cookie, SESSION_COOKIE},
    types::SessionResponse,
};
use crate::middleware::RequestContext;
use crate::shared::{AppError, AppState};
use crate::user::{LoginRequest, UserService};

/// HTTP handler for logging in
///
/// POST /login
/// Sets the `token` cookie and returns when it expires
#[instrument(name = "login", skip(state, ctx, payload))]
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    info!(username = %request.username, "Logging in");

    let service = UserService::new(Arc::clone(&state.user_repository), state.passwords.clone());
    let user = service.authenticate(&ctx, &request).await?;

    let (token, claims) = state.tokens.issue(&user.id, &user.username)?;
    let cookie = session_cookie(&token, claims.expires_at())?;

    info!(user_id = %user.id, expires_at = %claims.expires_at(), "User logged in successfully");

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(SessionResponse {
            message: "User logged in successfully".to_string(),
            expires_at: claims.expires_at(),
        }),
    ))
}

/// HTTP handler for extending a session
///
/// POST /refresh
/// Reissues the `token` cookie for the same identity with a fresh expiry
#[instrument(name = "refresh", skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = get_cookie(&headers, SESSION_COOKIE).ok_or_else(|| {
        warn!("Refresh attempted without a session cookie");
        AppError::ReadFailure("missing token cookie".to_string())
    })?;

    let (token, claims) = state.tokens.refresh(token).map_err(|e| {
        warn!(reason = %e, "Refusing to refresh session");
        AppError::from(e)
    })?;
    let cookie = session_cookie(&token, claims.expires_at())?;

    info!(user_id = %claims.user_id, expires_at = %claims.expires_at(), "Session refreshed");

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(SessionResponse {
            message: "Token refreshed successfully".to_string(),
            expires_at: claims.expires_at(),
        }),
    ))
}
