use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use strum_macros::{AsRefStr, EnumIter};
use thiserror::Error;

use crate::config::AppConfig;
use crate::media::ImageStore;
use crate::session::TokenService;
use crate::user::{password::PasswordService, repository::UserRepository};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub passwords: PasswordService,
    pub tokens: TokenService,
    pub images: ImageStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        passwords: PasswordService,
        tokens: TokenService,
        images: ImageStore,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            user_repository,
            passwords,
            tokens,
            images,
            config,
        }
    }
}

/// Failure categories and the HTTP status each one renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter)]
pub enum ErrorKind {
    #[strum(serialize = "UNABLE_TO_SAVE")]
    SaveFailure,
    #[strum(serialize = "UNABLE_TO_FIND_RESOURCE")]
    NotFound,
    #[strum(serialize = "UNABLE_TO_READ")]
    ReadFailure,
    #[strum(serialize = "UNAUTHORIZED")]
    Unauthorized,
    #[strum(serialize = "INTERNAL")]
    Internal,
    #[strum(serialize = "REQUEST_TIMEOUT")]
    Timeout,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::SaveFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ReadFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("UNABLE_TO_SAVE({0})")]
    SaveFailure(String),

    #[error("UNABLE_TO_FIND_RESOURCE({0})")]
    NotFound(String),

    #[error("UNABLE_TO_READ({0})")]
    ReadFailure(String),

    #[error("UNAUTHORIZED({0})")]
    Unauthorized(String),

    #[error("INTERNAL({0})")]
    Internal(String),

    #[error("REQUEST_TIMEOUT(request timed out)")]
    Timeout,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::SaveFailure(_) => ErrorKind::SaveFailure,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::ReadFailure(_) => ErrorKind::ReadFailure,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Internal(_) => ErrorKind::Internal,
            AppError::Timeout => ErrorKind::Timeout,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AppError::SaveFailure(detail)
            | AppError::NotFound(detail)
            | AppError::ReadFailure(detail)
            | AppError::Unauthorized(detail)
            | AppError::Internal(detail) => detail,
            AppError::Timeout => "request timed out",
        }
    }
}

/// Marker left on every response rendered from an `AppError`
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let body = Json(json!({
            "error": self.to_string()
        }));

        let mut response = (kind.status(), body).into_response();
        response.extensions_mut().insert(Failure {
            kind,
            detail: self.detail().to_string(),
        });
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        AppError::ReadFailure("error parsing request body".to_string())
    }
}

/// Success envelope shared by the JSON endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub metadata: Map<String, Value>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            metadata: Map::new(),
            data,
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}
