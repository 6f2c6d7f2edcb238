//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, PasswordHash, User, UserAccount, UserId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewUserRow, UserProfileChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed user store.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, |message| UserPersistenceError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        |message| UserPersistenceError::query(message),
        |message| UserPersistenceError::connection(message),
    )
}

fn map_row(row: UserRow) -> Result<User, UserPersistenceError> {
    row.into_user()
        .map_err(|message| UserPersistenceError::query(format!("corrupt user row: {message}")))
}

fn uuids(ids: &[UserId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&NewUserRow::from_account(account))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(account.user.email().as_ref())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = UserProfileChangeset {
            name: user.name().as_ref(),
            email: user.email().as_ref(),
            updated_at: Utc::now(),
        };
        let updated = diesel::update(users::table.find(user.id().as_uuid()))
            .set(&changeset)
            .execute(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(user.email().as_ref())
                } else {
                    map_diesel_error(err)
                }
            })?;
        Ok(updated > 0)
    }

    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(id.as_uuid()))
            .set((
                users::password_hash.eq(hash.as_str()),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(map_row).transpose()
    }

    async fn find_account_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| {
            row.into_account().map_err(|message| {
                UserPersistenceError::query(format!("corrupt user row: {message}"))
            })
        })
        .transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(uuids(ids)))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(map_row).collect()
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order_by((users::name.asc(), users::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(map_row).collect()
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    UserPersistenceError::still_referenced()
                } else {
                    map_diesel_error(err)
                }
            })?;
        Ok(deleted > 0)
    }
}
