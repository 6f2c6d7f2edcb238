//! Account registration, login, self-service profile edits and admin user
//! management.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccessTokenService, AccountCommand, AuthSession, CreateUserRequest, PasswordHasher,
    ProfileUpdate, RegisterRequest, UserAdministration, UserPersistenceError, UserRepository,
    UserUpdate,
};
use crate::domain::{
    AuthenticatedUser, DisplayName, EmailAddress, Error, LoginCredentials, Password, PasswordHash,
    Role, User, UserAccount, UserId,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Hashed once and verified against when a login names an unknown email, so
/// that path costs the same as a wrong password.
const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Run CPU-bound hashing on the blocking pool instead of the async executor.
async fn off_executor<T, F>(task: F) -> Result<T, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|err| {
        error!(error = %err, "password hashing task failed");
        Error::internal("password hashing failed")
    })
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
        }
        UserPersistenceError::StillReferenced => {
            Error::conflict("user is still referenced by tickets or notes")
        }
        other => {
            error!(error = %other, "user repository failure");
            Error::internal(format!("user storage failed: {other}"))
        }
    }
}

/// Account service generic over the user repository.
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn AccessTokenService>,
    decoy_hash: Arc<OnceCell<PasswordHash>>,
}

impl<U> AccountService<U>
where
    U: UserRepository,
{
    pub fn new(
        users: Arc<U>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn AccessTokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn hash_password(&self, password: Password) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        off_executor(move || hasher.hash(&password))
            .await?
            .map_err(|err| {
                error!(error = %err, "password hashing failed");
                Error::internal("password hashing failed")
            })
    }

    async fn hash(&self, raw: &Zeroizing<String>) -> Result<PasswordHash, Error> {
        let password = Password::new(raw)?;
        self.hash_password(password).await
    }

    async fn verify(&self, candidate: &str, hash: PasswordHash) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let candidate = Zeroizing::new(candidate.to_owned());
        off_executor(move || hasher.verify(&candidate, &hash))
            .await?
            .map_err(|err| {
                error!(error = %err, "password verification failed");
                Error::internal("password verification failed")
            })
    }

    /// Spend one verification on a hash nobody owns. The outcome is ignored.
    async fn verify_decoy(&self, candidate: &str) -> Result<(), Error> {
        let decoy = self
            .decoy_hash
            .get_or_try_init(|| async {
                self.hash_password(Password::new(DECOY_PASSWORD)?).await
            })
            .await?
            .clone();
        self.verify(candidate, decoy).await?;
        Ok(())
    }

    fn session_for(&self, user: User) -> Result<AuthSession, Error> {
        let token = self.tokens.issue(user.id()).map_err(|err| {
            error!(error = %err, user_id = %user.id(), "token signing failed");
            Error::internal("token signing failed")
        })?;
        Ok(AuthSession { token, user })
    }

    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &Zeroizing<String>,
        role: Role,
    ) -> Result<User, Error> {
        let name = DisplayName::new(name)?;
        let email = EmailAddress::new(email)?;
        let password_hash = self.hash(password).await?;
        let user = User::new(UserId::random(), name, email, role);

        self.users
            .insert(&UserAccount {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(map_user_error)?;
        info!(user_id = %user.id(), role = %user.role(), "user created");
        Ok(user)
    }

    async fn load(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn apply_profile(
        &self,
        current: User,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<User, Error> {
        let name = match name {
            Some(raw) => DisplayName::new(raw)?,
            None => current.name().clone(),
        };
        let email = match email {
            Some(raw) => EmailAddress::new(raw)?,
            None => current.email().clone(),
        };
        let updated = current.with_profile(name, email);
        let found = self
            .users
            .update_profile(&updated)
            .await
            .map_err(map_user_error)?;
        if !found {
            return Err(Error::not_found(format!("user {} not found", updated.id())));
        }
        Ok(updated)
    }
}

#[async_trait]
impl<U> AccountCommand for AccountService<U>
where
    U: UserRepository,
{
    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, Error> {
        let user = self
            .create_account(
                &request.name,
                &request.email,
                &request.password,
                Role::Customer,
            )
            .await?;
        self.session_for(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, Error> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        let account = self
            .users
            .find_account_by_email(credentials.email())
            .await
            .map_err(map_user_error)?;

        let Some(account) = account else {
            self.verify_decoy(credentials.password()).await?;
            warn!("login attempt for unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let verified = self
            .verify(credentials.password(), account.password_hash.clone())
            .await?;
        if !verified {
            warn!(user_id = %account.user.id(), "login attempt with wrong password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        info!(user_id = %account.user.id(), "user logged in");
        self.session_for(account.user)
    }

    async fn update_profile(
        &self,
        actor: &AuthenticatedUser,
        update: ProfileUpdate,
    ) -> Result<User, Error> {
        let ProfileUpdate {
            name,
            email,
            password,
        } = update;
        if name.is_none() && email.is_none() && password.is_none() {
            return Err(Error::invalid_request("no changes requested"));
        }

        let current = self.load(actor.id()).await?;
        let new_hash = match password.as_ref() {
            Some(raw) => Some(self.hash(raw).await?),
            None => None,
        };
        let updated = if name.is_some() || email.is_some() {
            self.apply_profile(current, name, email).await?
        } else {
            current
        };
        if let Some(hash) = new_hash {
            self.users
                .update_password(updated.id(), &hash)
                .await
                .map_err(map_user_error)?;
        }
        info!(user_id = %updated.id(), "profile updated");
        Ok(updated)
    }
}

#[async_trait]
impl<U> UserAdministration for AccountService<U>
where
    U: UserRepository,
{
    async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_error)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.load(id).await
    }

    async fn create_user(&self, request: CreateUserRequest) -> Result<User, Error> {
        self.create_account(&request.name, &request.email, &request.password, request.role)
            .await
    }

    async fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<User, Error> {
        if update.name.is_none() && update.email.is_none() {
            return Err(Error::invalid_request("no changes requested"));
        }
        let current = self.load(id).await?;
        self.apply_profile(current, update.name, update.email).await
    }

    async fn delete_user(&self, actor: &AuthenticatedUser, id: &UserId) -> Result<(), Error> {
        if actor.id() == id {
            return Err(Error::invalid_request("admins cannot delete their own account")
                .with_details(serde_json::json!({ "field": "id", "code": "self_delete" })));
        }
        let deleted = self.users.delete(id).await.map_err(map_user_error)?;
        if !deleted {
            return Err(Error::not_found(format!("user {id} not found")));
        }
        info!(user_id = %id, actor = %actor.id(), "user deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
