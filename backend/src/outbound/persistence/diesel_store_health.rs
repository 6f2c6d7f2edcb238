//! Readiness check against PostgreSQL: check out a pooled connection and run
//! `SELECT 1` on it.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoreHealth, StoreHealthError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::DbPool;

#[async_trait]
impl StoreHealth for DbPool {
    async fn check(&self) -> Result<(), StoreHealthError> {
        let mut conn = self
            .get()
            .await
            .map_err(|err| {
                map_basic_pool_error(err, |message| StoreHealthError::unavailable(message))
            })?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|err| {
                map_basic_diesel_error(
                    err,
                    |message| StoreHealthError::unavailable(message),
                    |message| StoreHealthError::unavailable(message),
                )
            })?;
        Ok(())
    }
}
