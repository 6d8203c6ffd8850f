use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::user::password::HashParams;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_PER_PAGE: usize = 5;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("JWT_KEY must be set to a non-empty value")]
    MissingSigningSecret,

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide configuration, loaded once at startup
#[derive(Clone)]
pub struct AppConfig {
    jwt_secret: String,
    pub bind_addr: String,
    pub request_timeout: Duration,
    pub upload_dir: PathBuf,
    pub default_per_page: usize,
    pub max_upload_bytes: usize,
    pub hash_params: HashParams,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("upload_dir", &self.upload_dir)
            .field("default_per_page", &self.default_per_page)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("hash_params", &self.hash_params)
            .finish()
    }
}

impl AppConfig {
    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_KEY")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::MissingSigningSecret)?;

        let timeout_secs = parse_positive(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let default_per_page = parse_positive(&lookup, "DEFAULT_PER_PAGE", DEFAULT_PER_PAGE)?;
        let max_upload_bytes = parse_positive(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let defaults = HashParams::default();
        let hash_params = HashParams {
            memory_kib: parse_positive(&lookup, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_positive(&lookup, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_positive(&lookup, "PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            jwt_secret,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            default_per_page,
            max_upload_bytes,
            hash_params,
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    #[cfg(test)]
    pub fn for_tests(secret: &str) -> Self {
        Self {
            jwt_secret: secret.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            upload_dir: std::env::temp_dir().join("sessiongate-test-uploads"),
            default_per_page: DEFAULT_PER_PAGE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            hash_params: HashParams::fast_for_tests(),
        }
    }
}

fn parse_positive<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}
