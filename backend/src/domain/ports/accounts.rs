//! Driving ports for self-service accounts and admin user management.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{AuthenticatedUser, Error, IssuedToken, Role, User, UserId};

/// Self-registration input. The role is always `customer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: Zeroizing<String>,
}

/// Admin-initiated account creation with an explicit role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: Zeroizing<String>,
    pub role: Role,
}

/// Caller-owned profile changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<Zeroizing<String>>,
}

/// Admin edits; the role cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Token plus the user it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: IssuedToken,
    pub user: User,
}

/// Registration, login and profile management.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, Error>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, Error>;

    async fn update_profile(
        &self,
        actor: &AuthenticatedUser,
        update: ProfileUpdate,
    ) -> Result<User, Error>;
}

/// User management. Callers must already hold the admin role.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAdministration: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, Error>;

    async fn get_user(&self, id: &UserId) -> Result<User, Error>;

    async fn create_user(&self, request: CreateUserRequest) -> Result<User, Error>;

    async fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<User, Error>;

    /// Remove a user; admins may not remove themselves.
    async fn delete_user(&self, actor: &AuthenticatedUser, id: &UserId) -> Result<(), Error>;
}
