// Library crate for the session-gated user service
// This file exposes the public API for integration tests

pub mod config;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, ConfigError};
pub use media::ImageStore;
pub use routes::build_router;
pub use session::{SessionClaims, TokenService, SESSION_COOKIE};
pub use shared::{AppError, AppState};
pub use user::{HashParams, InMemoryUserRepository, PasswordService};
