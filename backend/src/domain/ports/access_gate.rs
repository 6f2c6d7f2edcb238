//! Driving port resolving bearer credentials into an authenticated caller.

use async_trait::async_trait;

use crate::domain::{AuthenticatedUser, Error};

/// Authenticates raw bearer tokens.
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// Resolve a bearer token into the user it names.
    ///
    /// Fails with [`crate::domain::ErrorCode::Unauthorized`] when the token is
    /// absent, malformed, expired, or names a user that no longer exists.
    async fn authenticate(&self, token: Option<&str>) -> Result<AuthenticatedUser, Error>;
}
