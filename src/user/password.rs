use argon2::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashParams {
    #[cfg(test)]
    pub fn fast_for_tests() -> Self {
        Self {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PasswordError {
    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),

    #[error("unable to hash password: {0}")]
    Hash(String),

    #[error("stored digest is not a valid hash: {0}")]
    InvalidDigest(String),

    #[error("hashing worker failed: {0}")]
    Worker(String),
}

struct Hasher {
    argon2: Argon2<'static>,
    // Verified against when the username is unknown, so both paths cost the same
    dummy_digest: String,
}

/// Salted, memory-hard password hashing on the blocking thread pool
#[derive(Clone)]
pub struct PasswordService {
    inner: Arc<Hasher>,
}

impl PasswordService {
    pub fn new(params: HashParams) -> Result<Self, PasswordError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_digest = hash_with(&argon2, "not-a-real-password")?;

        Ok(Self {
            inner: Arc::new(Hasher {
                argon2,
                dummy_digest,
            }),
        })
    }

    #[instrument(skip_all)]
    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let inner = Arc::clone(&self.inner);
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || hash_with(&inner.argon2, &plaintext))
            .await
            .map_err(|e| PasswordError::Worker(e.to_string()))?
    }

    #[instrument(skip_all)]
    pub async fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, PasswordError> {
        let inner = Arc::clone(&self.inner);
        let digest = digest.to_string();
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || verify_with(&inner.argon2, &digest, &plaintext))
            .await
            .map_err(|e| PasswordError::Worker(e.to_string()))?
    }

    /// Spends one verification on a fixed digest and always reports a mismatch
    #[instrument(skip_all)]
    pub async fn reject_unknown(&self, plaintext: &str) -> Result<bool, PasswordError> {
        let digest = self.inner.dummy_digest.clone();
        self.verify(&digest, plaintext).await?;
        Ok(false)
    }
}

fn hash_with(argon2: &Argon2<'static>, plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_with(argon2: &Argon2<'static>, digest: &str, plaintext: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(|e| PasswordError::InvalidDigest(e.to_string()))?;

    match argon2.verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => {
            debug!("Password mismatch");
            Ok(false)
        }
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(HashParams::fast_for_tests()).unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let passwords = service();
        let digest = passwords.hash("correct horse").await.unwrap();

        assert_ne!(digest, "correct horse");
        assert!(digest.starts_with("$argon2id$"));
        assert!(passwords.verify(&digest, "correct horse").await.unwrap());
        assert!(!passwords.verify(&digest, "wrong horse").await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let passwords = service();
        let first = passwords.hash("same").await.unwrap();
        let second = passwords.hash("same").await.unwrap();

        assert_ne!(first, second);
        assert!(passwords.verify(&first, "same").await.unwrap());
        assert!(passwords.verify(&second, "same").await.unwrap());
    }

    #[tokio::test]
    async fn test_reject_unknown_always_false() {
        let passwords = service();
        assert!(!passwords.reject_unknown("not-a-real-password").await.unwrap());
        assert!(!passwords.reject_unknown("anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_digest_is_an_error() {
        let result = service().verify("plaintext-not-a-hash", "pw").await;
        assert!(matches!(result, Err(PasswordError::InvalidDigest(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = HashParams {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        assert!(matches!(
            PasswordService::new(params),
            Err(PasswordError::InvalidParams(_))
        ));
    }
}
