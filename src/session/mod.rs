// Public API - what other modules can use
pub use cookie::{get_cookie, session_cookie, SESSION_COOKIE};
pub use handlers::{login, refresh};
pub use middleware::require_session;
pub use token::{TokenError, TokenService, SESSION_TTL_SECS};
pub use types::{AuthenticatedUser, SessionClaims, SessionResponse};

// Internal modules
mod cookie;
mod handlers;
mod middleware;
mod token;
mod types;
