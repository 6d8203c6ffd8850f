use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::media;
use crate::middleware::{enforce_deadline, render_failures, RequestDeadline};
use crate::session;
use crate::shared::{AppError, AppState};
use crate::user;

/// Builds the full application router.
///
/// Layering, outermost first: tracing, request deadline, session check
/// (protected routes only), failure rendering, handler.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let public = Router::new()
        .route("/health", get(health))
        .route("/register", post(user::register))
        .route("/login", post(session::login))
        .route("/refresh", post(session::refresh))
        .route_layer(middleware::from_fn(render_failures));

    let protected = Router::new()
        .route("/users", get(user::list_users))
        .route("/upload", post(media::upload))
        .route("/images/:name", get(media::get_image))
        .route_layer(middleware::from_fn(render_failures))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            RequestDeadline::new(config.request_timeout),
            enforce_deadline,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> AppError {
    AppError::NotFound("unable to find resource".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // for `oneshot`

    async fn send(uri: &str) -> axum::response::Response {
        build_router(AppStateBuilder::new().build())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = send("/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_protected_routes_need_session() {
        for uri in ["/users", "/images/pixel.png"] {
            let response = send(uri).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(
                body_json(response).await,
                json!({"error": "UNAUTHORIZED(missing session token)"})
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_shape() {
        let response = send("/nowhere").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"error": "UNABLE_TO_FIND_RESOURCE(unable to find resource)"})
        );
    }
}
