//! Argon2id password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier};

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{Password, PasswordHash};

/// Hashes with the default Argon2id parameters and stores PHC strings.
#[derive(Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|phc| PasswordHash::new(phc.to_string()))
            .map_err(|err| PasswordHashError::hashing(err.to_string()))
    }

    fn verify(&self, candidate: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        let parsed = password_hash::PasswordHash::new(hash.as_str())
            .map_err(|err| PasswordHashError::hashing(format!("invalid hash format: {err}")))?;
        match self.argon2.verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordHashError::hashing(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn hashes_verify_against_the_original_password() {
        let hasher = Argon2PasswordHasher::new();
        let password = Password::new("correct horse battery").expect("valid password");
        let hash = hasher.hash(&password).expect("hashed");

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery", &hash).expect("verified"));
        assert!(!hasher.verify("wrong horse battery", &hash).expect("verified"));
    }

    #[rstest]
    fn salts_differ_between_hashes() {
        let hasher = Argon2PasswordHasher::new();
        let password = Password::new("correct horse battery").expect("valid password");
        let first = hasher.hash(&password).expect("hashed");
        let second = hasher.hash(&password).expect("hashed");
        assert_ne!(first, second);
    }

    #[rstest]
    fn malformed_hashes_are_errors() {
        let err = Argon2PasswordHasher::new()
            .verify("anything", &PasswordHash::new("not-a-phc-string"))
            .expect_err("malformed");
        assert!(err.to_string().contains("invalid hash format"));
    }
}
