use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use super::context::RequestContext;
use crate::shared::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long an abandoned handler may keep running before it is aborted
pub const ABANDON_GRACE: Duration = Duration::from_secs(30);

/// Deadline applied to every request
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline {
    pub limit: Duration,
    pub grace: Duration,
}

impl RequestDeadline {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            grace: ABANDON_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

/// Timeout middleware - creates the request context and races the downstream
/// stack, run as its own task, against the deadline.
/// Usage: .layer(middleware::from_fn_with_state(RequestDeadline::new(limit), enforce_deadline))
/// Handlers pick up the context with a `RequestContext` extractor.
#[instrument(skip_all)]
pub async fn enforce_deadline(
    State(deadline): State<RequestDeadline>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = RequestContext::new();
    let request_id = context.request_id;
    let cancellation = context.cancellation().clone();
    req.extensions_mut().insert(context);

    let span = info_span!("request", request_id = %request_id, uri = %req.uri());
    let mut handle = tokio::spawn(next.run(req).instrument(span));

    let mut response = tokio::select! {
        joined = &mut handle => match joined {
            Ok(response) => response,
            Err(join_error) => {
                log_join_failure(request_id, join_error);
                AppError::Internal("handler panicked".to_string()).into_response()
            }
        },
        _ = tokio::time::sleep(deadline.limit) => {
            warn!(
                request_id = %request_id,
                limit_ms = deadline.limit.as_millis() as u64,
                "Request deadline elapsed, cancelling handler"
            );
            cancellation.cancel();
            tokio::spawn(watch_abandoned(request_id, handle, deadline.grace));
            AppError::Timeout.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// How a handler task ended once nobody was waiting for its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskEnd {
    Finished,
    Panicked,
    Cancelled,
    Aborted,
}

/// Waits on a handler whose client already got a timeout, so nothing it does goes unseen
async fn watch_abandoned(
    request_id: Uuid,
    mut handle: JoinHandle<Response>,
    grace: Duration,
) -> TaskEnd {
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(Ok(response)) => {
            debug!(
                request_id = %request_id,
                status = %response.status(),
                "Abandoned handler finished, response discarded"
            );
            TaskEnd::Finished
        }
        Ok(Err(join_error)) => log_join_failure(request_id, join_error),
        Err(_) => {
            handle.abort();
            error!(
                request_id = %request_id,
                grace_ms = grace.as_millis() as u64,
                "Abandoned handler ignored cancellation, aborting task"
            );
            TaskEnd::Aborted
        }
    }
}

fn log_join_failure(request_id: Uuid, join_error: JoinError) -> TaskEnd {
    if join_error.is_panic() {
        let payload = join_error.into_panic();
        error!(
            request_id = %request_id,
            panic = %panic_message(payload.as_ref()),
            "Handler panicked"
        );
        TaskEnd::Panicked
    } else {
        error!(request_id = %request_id, "Handler task was cancelled: {}", join_error);
        TaskEnd::Cancelled
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
