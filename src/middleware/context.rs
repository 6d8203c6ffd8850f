use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::shared::AppError;

/// Per-request bag created at request entry and dropped with the response
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub user_id: Option<String>,
    cancellation: CancellationToken,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fails with `Timeout` once the request's deadline has fired
    pub fn ensure_active(&self) -> Result<(), AppError> {
        if self.is_cancelled() {
            return Err(AppError::Timeout);
        }
        Ok(())
    }

    /// Runs a fallible I/O step, abandoning it as soon as the deadline fires
    pub async fn guard<F, T>(&self, step: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        self.ensure_active()?;
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(AppError::Timeout),
            result = step => result,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
