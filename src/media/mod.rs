// Public API - what other modules can use
pub use handlers::{get_image, upload};
pub use store::{ImageStore, StorageError, StoredImage, PUBLIC_PREFIX};

// Internal modules
mod handlers;
mod store;
