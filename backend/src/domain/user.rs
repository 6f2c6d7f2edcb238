//! User data model: identifiers, display names, email addresses and roles.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyDisplayName,
    DisplayNameTooLong { max: usize },
    DisplayNameInvalidCharacters,
    InvalidEmail,
    EmailTooLong { max: usize },
    UnknownRole,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyDisplayName => write!(f, "name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "name must be at most {max} characters")
            }
            Self::DisplayNameInvalidCharacters => {
                write!(f, "name must not contain control characters")
            }
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::UnknownRole => write!(f, "role must be one of customer, agent, admin"),
        }
    }
}

impl std::error::Error for UserValidationError {}

impl From<UserValidationError> for super::Error {
    fn from(err: UserValidationError) -> Self {
        let (field, code) = match err {
            UserValidationError::EmptyId | UserValidationError::InvalidId => ("id", "invalid_id"),
            UserValidationError::EmptyDisplayName => ("name", "empty_name"),
            UserValidationError::DisplayNameTooLong { .. } => ("name", "name_too_long"),
            UserValidationError::DisplayNameInvalidCharacters => ("name", "invalid_characters"),
            UserValidationError::InvalidEmail => ("email", "invalid_email"),
            UserValidationError::EmailTooLong { .. } => ("email", "email_too_long"),
            UserValidationError::UnknownRole => ("role", "unknown_role"),
        };
        super::Error::invalid_request(err.to_string())
            .with_details(serde_json::json!({ "field": field, "code": code }))
    }
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self::from_uuid(parsed))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Human readable name shown on tickets and notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

impl DisplayName {
    /// Validate and construct a [`DisplayName`]; surrounding whitespace is
    /// trimmed.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(UserValidationError::DisplayNameInvalidCharacters);
        }

        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Case-insensitive email address, stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Maximum stored length of an email address, matching the `users.email`
/// column.
pub const EMAIL_MAX: usize = 320;

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use helpdesk::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("  Ada@Example.COM ").unwrap();
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = email.as_ref().trim().to_lowercase();
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Access role held by a user. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Agent,
    Admin,
}

impl Role {
    /// Stable lowercase label used in storage and tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }

    /// Whether the role works tickets on behalf of customers.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Agent | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "customer" => Ok(Self::Customer),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole),
        }
    }
}

/// Helpdesk user.
///
/// ## Invariants
/// - `email` is unique across users (enforced by the store).
/// - `role` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(value_type = String, example = "Ada Lovelace")]
    name: DisplayName,
    #[schema(value_type = String, example = "ada@example.com")]
    email: EmailAddress,
    role: Role,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub fn new(id: UserId, name: DisplayName, email: EmailAddress, role: Role) -> Self {
        Self {
            id,
            name,
            email,
            role,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Name shown to other users.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Normalised email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Access role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Return a copy with a new name and email; identity and role are kept.
    pub fn with_profile(self, name: DisplayName, email: EmailAddress) -> Self {
        Self {
            name,
            email,
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    id: String,
    name: String,
    email: String,
    role: Role,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        let User {
            id,
            name,
            email,
            role,
        } = value;
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        Ok(User::new(
            UserId::new(value.id)?,
            DisplayName::new(value.name)?,
            EmailAddress::new(value.email)?,
            value.role,
        ))
    }
}
