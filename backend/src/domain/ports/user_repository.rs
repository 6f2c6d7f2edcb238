//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{EmailAddress, PasswordHash, User, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
        /// Tickets or notes still reference the user.
        StillReferenced => "user is still referenced by tickets or notes",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError>;

    /// Overwrite name and email of an existing user. Returns `false` when the
    /// user does not exist.
    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError>;

    /// Replace the stored credential hash.
    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<bool, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch an account, credential included, by email.
    async fn find_account_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Fetch every user among `ids`; unknown ids are skipped.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;

    /// List users ordered by name.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Remove a user. Returns `false` when nothing matched.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}
