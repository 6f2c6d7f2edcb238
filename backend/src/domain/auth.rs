//! Authentication primitives: login credentials, passwords and the
//! authenticated caller.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{EmailAddress, Role, User, UserId};

/// Minimum accepted length for a new password.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Email was missing or malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// New password shorter than [`PASSWORD_MIN_LENGTH`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

impl From<CredentialValidationError> for super::Error {
    fn from(err: CredentialValidationError) -> Self {
        let (field, code) = match err {
            CredentialValidationError::InvalidEmail => ("email", "invalid_email"),
            CredentialValidationError::EmptyPassword => ("password", "empty_password"),
            CredentialValidationError::PasswordTooShort { .. } => ("password", "password_too_short"),
        };
        super::Error::invalid_request(err.to_string())
            .with_details(serde_json::json!({ "field": field, "code": code }))
    }
}

/// Plaintext password chosen by a user, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a new password against the length policy.
    pub fn new(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        if raw.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(CredentialValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LENGTH,
            });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Expose the plaintext for hashing.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Opaque password hash in PHC string format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a stored PHC string.
    pub fn new(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// The PHC-encoded hash.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Stored user together with its credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// Validated login credentials used by the account service.
///
/// ## Invariants
/// - `email` is normalised to lowercase.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use helpdesk::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email =
            EmailAddress::new(email).map_err(|_| CredentialValidationError::InvalidEmail)?;

        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Caller identity resolved from a bearer token.
///
/// Passed explicitly to every operation that needs to know who is acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(User);

impl AuthenticatedUser {
    /// Wrap a user loaded from the store.
    pub fn new(user: User) -> Self {
        Self(user)
    }

    /// Identifier of the caller.
    pub fn id(&self) -> &UserId {
        self.0.id()
    }

    /// Role of the caller.
    pub fn role(&self) -> Role {
        self.0.role()
    }

    /// Full user record.
    pub fn user(&self) -> &User {
        &self.0
    }

    /// Consume the wrapper.
    pub fn into_user(self) -> User {
        self.0
    }
}

/// Token claims decoded from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: UserId,
}

/// Signed bearer token returned after login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
