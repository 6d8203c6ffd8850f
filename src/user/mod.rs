// Public API - what other modules can use
pub use handlers::{list_users, register};
pub use models::UserModel;
pub use password::{HashParams, PasswordError, PasswordService};
pub use repository::{InMemoryUserRepository, InsertUserResult, UserRepository};
pub use service::UserService;
pub use types::{LoginRequest, PageQuery, Pagination, RegisterRequest, UserPage, UserResponse};

// Internal modules
mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod types;
mod validation;
