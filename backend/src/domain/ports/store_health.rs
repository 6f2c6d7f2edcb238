//! Port for asking the backing store whether it can serve queries.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Reasons the store cannot take traffic.
    pub enum StoreHealthError {
        /// No connection could be checked out or the round trip failed.
        Unavailable { message: String } => "store unavailable: {message}",
    }
}

/// Cheap round trip against the store behind the repositories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn check(&self) -> Result<(), StoreHealthError>;
}
