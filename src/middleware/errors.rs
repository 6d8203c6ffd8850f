use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use super::context::RequestContext;
use crate::shared::{AppError, Failure};

/// Largest framework error body read for logging
const MAX_DETAIL_BYTES: usize = 4 * 1024;

/// Error middleware - the single place failures leave the handler stack.
/// Failures rendered from `AppError` are logged with the request id; bare
/// framework error responses (extractor rejections and the like) are
/// re-rendered in the same `{"error": "KIND(detail)"}` shape and status table.
pub async fn render_failures(ctx: RequestContext, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let status = response.status();

    match response.extensions().get::<Failure>().cloned() {
        Some(failure) => {
            log_failure(&ctx, &method, &path, status, &failure);
            response
        }
        None if status.is_client_error() || status.is_server_error() => {
            let translated = translate_bare(response).await;
            if let Some(failure) = translated.extensions().get::<Failure>() {
                log_failure(&ctx, &method, &path, translated.status(), failure);
            }
            translated
        }
        None => response,
    }
}

/// Re-renders an error response produced outside `AppError`. The status comes
/// from the kind table; the framework's own message is only logged.
async fn translate_bare(response: Response) -> Response {
    let (parts, body) = response.into_parts();
    let status = parts.status;

    if let Some(original) = read_detail(body).await {
        debug!(status = status.as_u16(), original = %original, "Translating framework error");
    }
    let detail = generic_detail(status);

    let app_error = match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(detail),
        StatusCode::NOT_FOUND => AppError::NotFound(detail),
        s if s.is_server_error() => AppError::Internal(detail),
        _ => AppError::ReadFailure(detail),
    };

    app_error.into_response()
}

async fn read_detail(body: Body) -> Option<String> {
    let bytes = to_bytes(body, MAX_DETAIL_BYTES).await.ok()?;
    let text = std::str::from_utf8(&bytes).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_string())
}

fn generic_detail(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_lowercase()
}

fn log_failure(
    ctx: &RequestContext,
    method: &axum::http::Method,
    path: &str,
    status: StatusCode,
    failure: &Failure,
) {
    if status.is_server_error() {
        error!(
            request_id = %ctx.request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            kind = failure.kind.as_ref(),
            detail = %failure.detail,
            "Request failed"
        );
    } else {
        warn!(
            request_id = %ctx.request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            kind = failure.kind.as_ref(),
            detail = %failure.detail,
            "Request rejected"
        );
    }
}
