use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    service::UserService,
    types::{PageQuery, Pagination, RegisterRequest, UserResponse},
};
use crate::middleware::RequestContext;
use crate::session::AuthenticatedUser;
use crate::shared::{ApiResponse, AppError, AppState};

/// HTTP handler for registering a new user
///
/// POST /register
/// Returns the stored user (without its password hash) and 201
#[instrument(name = "register", skip(state, ctx, payload))]
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), AppError> {
    let Json(request) = payload?;
    info!(username = %request.username, "Registering user");

    let service = UserService::new(Arc::clone(&state.user_repository), state.passwords.clone());
    let user = service.register(&ctx, request).await?;

    info!(user_id = %user.id, username = %user.username, "User registered successfully");

    Ok((StatusCode::CREATED, Json(ApiResponse::new(user))))
}

/// HTTP handler for listing users page by page
///
/// GET /users?page=&per_page=
/// Requires a valid session
#[instrument(name = "list_users", skip(state, query, caller), fields(caller = %caller.username))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    // An unreadable query string gets the default page, like any bad value
    let query = query.map(|Query(query)| query).unwrap_or_else(|rejection| {
        debug!(reason = %rejection.body_text(), "Ignoring unreadable page query");
        PageQuery::default()
    });
    let pagination = Pagination::from_query(&query, state.config.default_per_page);
    info!(page = pagination.page, per_page = pagination.per_page, "Listing users");

    let service = UserService::new(Arc::clone(&state.user_repository), state.passwords.clone());
    let page = service.list_users(pagination).await?;

    info!(user_count = page.users.len(), total = page.total, "Users listed successfully");

    Ok(Json(
        ApiResponse::new(page.users)
            .with_metadata("page", page.pagination.page)
            .with_metadata("per_page", page.pagination.per_page)
            .with_metadata("total", page.total),
    ))
}
