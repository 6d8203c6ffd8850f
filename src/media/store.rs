use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::middleware::RequestContext;
use crate::shared::AppError;

/// Location prefix reported back to clients for stored files
pub const PUBLIC_PREFIX: &str = "uploads";

/// Subdirectory of the upload root holding files still being written
const STAGING_DIR: &str = ".incoming";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file name is empty or not a plain file name")]
    InvalidName,

    #[error("content is not a recognised image")]
    NotAnImage,

    #[error("unable to create upload directory: {0}")]
    CreateDir(std::io::Error),

    #[error("unable to write file: {0}")]
    Write(std::io::Error),

    #[error("file not found")]
    Missing,

    #[error("unable to read file: {0}")]
    Read(std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName => AppError::ReadFailure("invalid file name".to_string()),
            StorageError::NotAnImage => {
                AppError::ReadFailure("only image files are allowed".to_string())
            }
            StorageError::CreateDir(_) => {
                AppError::SaveFailure("Error creating directory".to_string())
            }
            StorageError::Write(_) => AppError::SaveFailure("unable to save file".to_string()),
            StorageError::Missing => AppError::NotFound("unable to find resource".to_string()),
            StorageError::Read(_) => AppError::ReadFailure("unable to open file".to_string()),
        }
    }
}

/// A stored image read back from disk
#[derive(Debug)]
pub struct StoredImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Flat directory of uploaded images
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes an image under its client-supplied name, replacing any existing
    /// file, and returns the public location `uploads/<name>`.
    #[instrument(skip(self, ctx, bytes), fields(size = bytes.len()))]
    pub async fn save(
        &self,
        ctx: &RequestContext,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let name = sanitize_file_name(file_name).ok_or(StorageError::InvalidName)?;

        let format = image::guess_format(bytes).map_err(|e| {
            debug!(error = %e, "Upload is not a recognised image");
            StorageError::NotAnImage
        })?;
        debug!(name = %name, mime = format.to_mime_type(), "Storing image");

        // Staged next to the final file so the rename stays on one filesystem
        let staging = self.root.join(STAGING_DIR);
        let partial = staging.join(format!("{}.{}", Uuid::new_v4(), name));

        let stored = ctx
            .guard(async {
                tokio::fs::create_dir_all(&staging).await.map_err(|e| {
                    warn!(error = %e, root = %self.root.display(), "Failed to create upload directory");
                    AppError::from(StorageError::CreateDir(e))
                })?;

                tokio::fs::write(&partial, bytes).await.map_err(|e| {
                    warn!(error = %e, "Failed to write uploaded file");
                    AppError::from(StorageError::Write(e))
                })?;

                tokio::fs::rename(&partial, self.root.join(name)).await.map_err(|e| {
                    warn!(error = %e, "Failed to move uploaded file into place");
                    AppError::from(StorageError::Write(e))
                })
            })
            .await;

        if stored.is_err() {
            // The final name is untouched; only the partial file can be left over
            if let Err(e) = tokio::fs::remove_file(&partial).await {
                if e.kind() != IoErrorKind::NotFound {
                    warn!(error = %e, "Failed to remove partial upload");
                }
            }
        }
        stored?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }

    /// Reads a stored image and sniffs its content type
    #[instrument(skip(self, ctx))]
    pub async fn load(&self, ctx: &RequestContext, name: &str) -> Result<StoredImage, AppError> {
        if !is_plain_name(name) {
            debug!("Rejecting image name with path components");
            return Err(StorageError::Missing.into());
        }

        let bytes = ctx
            .guard(async {
                tokio::fs::read(self.root.join(name)).await.map_err(|e| {
                    let err = match e.kind() {
                        IoErrorKind::NotFound => StorageError::Missing,
                        _ => StorageError::Read(e),
                    };
                    debug!(error = %err, "Failed to read image");
                    AppError::from(err)
                })
            })
            .await?;

        let content_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");

        Ok(StoredImage {
            bytes,
            content_type,
        })
    }
}

/// Reduces a client file name to its final component
fn sanitize_file_name(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    is_plain_name(name).then_some(name)
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
pub(crate) mod test_images {
    /// Smallest valid PNG: a 1x1 transparent pixel
    pub const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];
}
