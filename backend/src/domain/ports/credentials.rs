//! Ports for credential hashing and bearer token handling.

use crate::domain::{IssuedToken, Password, PasswordHash, TokenSubject, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing failed or the stored hash is malformed.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

define_port_error! {
    /// Errors raised while issuing or verifying bearer tokens.
    pub enum TokenError {
        /// Token lifetime has elapsed.
        Expired => "token expired",
        /// Token is malformed, badly signed, or carries unexpected claims.
        Invalid { message: String } => "token invalid: {message}",
        /// Token could not be signed.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// One-way password hashing.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a new password.
    fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError>;

    /// Check a plaintext candidate against a stored hash.
    fn verify(&self, candidate: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError>;
}

/// Signed, expiring bearer tokens naming a user.
#[cfg_attr(test, mockall::automock)]
pub trait AccessTokenService: Send + Sync {
    /// Issue a token for `user_id`.
    fn issue(&self, user_id: &UserId) -> Result<IssuedToken, TokenError>;

    /// Verify signature, expiry and issuer, returning the subject.
    fn verify(&self, token: &str) -> Result<TokenSubject, TokenError>;
}
