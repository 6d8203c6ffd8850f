use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey,
    EncodingKey, Header, Validation,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use super::types::SessionClaims;
use crate::config::ConfigError;
use crate::shared::AppError;

/// Fixed session lifetime; callers cannot choose their own
pub const SESSION_TTL_SECS: i64 = 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("unable to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => AppError::Unauthorized("invalid token".to_string()),
            TokenError::Expired(_) => AppError::Unauthorized("token has expired".to_string()),
            TokenError::Malformed(detail) | TokenError::Signing(detail) => {
                AppError::ReadFailure(detail)
            }
        }
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and validates HS256 session tokens
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    validation: Arc<Validation>,
}

impl TokenService {
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingSigningSecret);
        }

        // Expiry is enforced by hand against our own clock, without leeway
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            validation: Arc::new(validation),
        })
    }

    /// Issues a token for the given identity, expiring one TTL from now
    pub fn issue(&self, user_id: &str, username: &str) -> Result<(String, SessionClaims), TokenError> {
        self.issue_at(user_id, username, Utc::now())
    }

    #[instrument(skip(self, user_id))]
    pub(crate) fn issue_at(
        &self,
        user_id: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionClaims), TokenError> {
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            exp: (now + Duration::seconds(SESSION_TTL_SECS)).timestamp(),
            iat: now.timestamp(),
        };

        debug!(exp_timestamp = claims.exp, "Creating session token");

        let token = encode(&Header::new(ALGORITHM), &claims, &self.keys.encoding).map_err(|e| {
            debug!(error = %e, "Failed to encode session token");
            TokenError::Signing(e.to_string())
        })?;

        Ok((token, claims))
    }

    /// Validates a token and returns its claims if the signature holds and it has not expired
    pub fn validate(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    #[instrument(skip(self, token))]
    pub(crate) fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, TokenError> {
        // Signature first, so tampering never surfaces as a parse error
        let (message, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| TokenError::Malformed("missing signature segment".to_string()))?;

        let verified = crypto::verify(signature, message.as_bytes(), &self.keys.decoding, ALGORITHM)
            .unwrap_or(false);
        if !verified {
            debug!("Session token signature mismatch");
            return Err(TokenError::InvalidSignature);
        }

        let claims = decode::<SessionClaims>(token, &self.keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Failed to decode session token");
                match e.kind() {
                    JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    _ => TokenError::Malformed(e.to_string()),
                }
            })?;

        if claims.is_expired_at(now) {
            debug!(username = %claims.username, exp = claims.exp, "Session token has expired");
            return Err(TokenError::Expired(claims.expires_at()));
        }

        debug!(username = %claims.username, exp = claims.exp, "Session token validated");
        Ok(claims)
    }

    /// Re-issues a still-valid token with the same identity and a fresh expiry
    pub fn refresh(&self, token: &str) -> Result<(String, SessionClaims), TokenError> {
        self.refresh_at(token, Utc::now())
    }

    #[instrument(skip(self, token))]
    pub(crate) fn refresh_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionClaims), TokenError> {
        let claims = self.validate_at(token, now)?;
        self.issue_at(&claims.user_id, &claims.username, now)
    }
}
