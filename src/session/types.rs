use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims structure carried by the session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub user_id: String,
    pub username: String,
    pub exp: i64, // Expiration timestamp, seconds since epoch
    pub iat: i64, // Issued at timestamp, seconds since epoch
}

impl SessionClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// A token is expired once the clock reaches its expiry, with no leeway
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Identity attached to requests that passed the auth middleware
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Response body for login and refresh
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}
