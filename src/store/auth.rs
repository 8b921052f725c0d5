use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::gateway::StoreError;

/// Identity returned by the authentication service.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("auth backend error: {0}")]
    Backend(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The external identity service. Credential storage and verification live
/// behind this trait; the local backends keep only password digests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Creates an identity. Fails with `EmailTaken` for a duplicate email.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Fails with `InvalidCredentials` for an unknown email or a wrong
    /// password, indistinguishably.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
