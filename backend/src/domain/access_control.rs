//! Bearer-token authentication and role authorisation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::domain::ports::{AccessGate, AccessTokenService, TokenError, UserRepository};
use crate::domain::{AuthenticatedUser, Error, Role};

/// Reject callers whose role is not in `roles`.
///
/// This is the only role check in the crate; inbound adapters call it once
/// per request.
///
/// # Examples
/// ```
/// use helpdesk::domain::{authorize, AuthenticatedUser, DisplayName, EmailAddress, Role, User, UserId};
///
/// let user = User::new(
///     UserId::random(),
///     DisplayName::new("Ada").unwrap(),
///     EmailAddress::new("ada@example.com").unwrap(),
///     Role::Customer,
/// );
/// let caller = AuthenticatedUser::new(user);
/// assert!(authorize(&caller, &[Role::Customer, Role::Admin]).is_ok());
/// assert!(authorize(&caller, &[Role::Admin]).is_err());
/// ```
pub fn authorize(user: &AuthenticatedUser, roles: &[Role]) -> Result<(), Error> {
    if roles.contains(&user.role()) {
        Ok(())
    } else {
        debug!(user_id = %user.id(), role = %user.role(), "role not permitted");
        Err(Error::forbidden(format!(
            "role {} is not permitted to perform this action",
            user.role()
        )))
    }
}

fn unauthenticated(reason: &str) -> Error {
    Error::unauthorized(format!("not authorized: {reason}"))
}

/// Access gate backed by a token verifier and the user store.
#[derive(Clone)]
pub struct AccessControlService<U> {
    tokens: Arc<dyn AccessTokenService>,
    users: Arc<U>,
}

impl<U> AccessControlService<U> {
    pub fn new(tokens: Arc<dyn AccessTokenService>, users: Arc<U>) -> Self {
        Self { tokens, users }
    }
}

#[async_trait]
impl<U> AccessGate for AccessControlService<U>
where
    U: UserRepository,
{
    async fn authenticate(&self, token: Option<&str>) -> Result<AuthenticatedUser, Error> {
        let token = token
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| unauthenticated("no token"))?;

        let subject = self.tokens.verify(token).map_err(|err| match err {
            TokenError::Expired => unauthenticated("token expired"),
            other => {
                debug!(error = %other, "bearer token rejected");
                unauthenticated("token failed")
            }
        })?;

        let user = self
            .users
            .find_by_id(&subject.user_id)
            .await
            .map_err(|err| {
                error!(error = %err, "user lookup failed during authentication");
                Error::internal(format!("user lookup failed: {err}"))
            })?
            .ok_or_else(|| unauthenticated("user not found"))?;

        Ok(AuthenticatedUser::new(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockAccessTokenService, MockUserRepository, UserPersistenceError};
    use crate::domain::{ErrorCode, TokenSubject};
    use crate::test_support::{caller, user_with_role};
    use rstest::rstest;

    fn service(
        tokens: MockAccessTokenService,
        users: MockUserRepository,
    ) -> AccessControlService<MockUserRepository> {
        AccessControlService::new(Arc::new(tokens), Arc::new(users))
    }

    #[rstest]
    #[case(Role::Customer, &[Role::Admin], false)]
    #[case(Role::Agent, &[Role::Agent, Role::Admin], true)]
    #[case(Role::Admin, &[Role::Admin], true)]
    #[case(Role::Customer, &[], false)]
    fn authorize_checks_membership(
        #[case] role: Role,
        #[case] required: &[Role],
        #[case] allowed: bool,
    ) {
        let result = authorize(&caller("Casey", role), required);
        match (allowed, result) {
            (true, Ok(())) => {}
            (false, Err(err)) => assert_eq!(err.code(), ErrorCode::Forbidden),
            (expected, other) => panic!("expected allowed={expected}, got {other:?}"),
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[tokio::test]
    async fn missing_token_is_unauthenticated(#[case] token: Option<&'static str>) {
        let gate = service(MockAccessTokenService::new(), MockUserRepository::new());
        let err = gate.authenticate(token).await.expect_err("no token");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[case(TokenError::Expired, "not authorized: token expired")]
    #[case(TokenError::invalid("bad signature"), "not authorized: token failed")]
    #[tokio::test]
    async fn rejected_tokens_are_unauthenticated(
        #[case] failure: TokenError,
        #[case] message: &str,
    ) {
        let mut tokens = MockAccessTokenService::new();
        tokens.expect_verify().return_once(move |_| Err(failure));
        let gate = service(tokens, MockUserRepository::new());

        let err = gate.authenticate(Some("abc")).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), message);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_user_is_unauthenticated() {
        let mut tokens = MockAccessTokenService::new();
        tokens.expect_verify().return_once(|_| {
            Ok(TokenSubject {
                user_id: crate::domain::UserId::random(),
            })
        });
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().return_once(|_| Ok(None));

        let err = service(tokens, users)
            .authenticate(Some("abc"))
            .await
            .expect_err("deleted user");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn valid_token_resolves_user() {
        let agent = user_with_role("Grace Hopper", Role::Agent);
        let id = agent.id().clone();
        let mut tokens = MockAccessTokenService::new();
        tokens
            .expect_verify()
            .withf(|token| token == "good")
            .return_once(move |_| Ok(TokenSubject { user_id: id }));
        let mut users = MockUserRepository::new();
        let stored = agent.clone();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));

        let resolved = service(tokens, users)
            .authenticate(Some(" good "))
            .await
            .expect("authenticated");
        assert_eq!(resolved.user(), &agent);
    }

    #[rstest]
    #[tokio::test]
    async fn storage_failure_is_internal() {
        let mut tokens = MockAccessTokenService::new();
        tokens.expect_verify().return_once(|_| {
            Ok(TokenSubject {
                user_id: crate::domain::UserId::random(),
            })
        });
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(|_| Err(UserPersistenceError::connection("refused")));

        let err = service(tokens, users)
            .authenticate(Some("abc"))
            .await
            .expect_err("storage down");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
