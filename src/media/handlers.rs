use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::{debug, info, instrument, warn};

use crate::middleware::RequestContext;
use crate::session::AuthenticatedUser;
use crate::shared::{ApiResponse, AppError, AppState};

/// Multipart field carrying the uploaded file
const IMAGE_FIELD: &str = "image";

/// HTTP handler for uploading an image
///
/// POST /upload (multipart, field `image`)
/// Returns the stored location as `uploads/<name>`
#[instrument(name = "upload", skip_all, fields(caller = %caller.username))]
pub async fn upload(
    State(state): State<AppState>,
    ctx: RequestContext,
    caller: AuthenticatedUser,
    form: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let mut form = form.map_err(|e| {
        warn!(reason = %e.body_text(), "Rejected upload form");
        AppError::ReadFailure("error parsing form data".to_string())
    })?;

    let unreadable = |e: axum::extract::multipart::MultipartError| {
        warn!(reason = %e.body_text(), "Failed to read upload form");
        AppError::ReadFailure("unable to read form data".to_string())
    };

    while let Some(field) = form.next_field().await.map_err(unreadable)? {
        if field.name() != Some(IMAGE_FIELD) {
            debug!(field = ?field.name(), "Skipping unrelated form field");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(unreadable)?;
        info!(file_name = %file_name, size = bytes.len(), "Received image upload");

        let location = state.images.save(&ctx, &file_name, &bytes).await?;
        info!(location = %location, "Image stored successfully");

        return Ok(Json(ApiResponse::new(location)));
    }

    warn!("Upload form had no image field");
    Err(AppError::ReadFailure("unable to read form data".to_string()))
}

/// HTTP handler for serving a previously uploaded image
///
/// GET /images/{name}
#[instrument(name = "get_image", skip(state, ctx, caller), fields(caller = %caller.username))]
pub async fn get_image(
    State(state): State<AppState>,
    ctx: RequestContext,
    caller: AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let image = state.images.load(&ctx, &name).await?;
    debug!(content_type = image.content_type, size = image.bytes.len(), "Serving image");

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes))
}
