//! Bearer-token extraction for HTTP handlers.
//!
//! [`Authenticated`] resolves the `Authorization: Bearer <token>` header
//! through the [`AccessGate`](crate::domain::ports::AccessGate) port. Role
//! checks happen once in the handler via [`Authenticated::require`].

use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::error;

use crate::domain::{AuthenticatedUser, Error, Role, authorize};
use crate::inbound::http::state::HttpState;

const BEARER: &str = "bearer";

/// Caller resolved from the request's bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated(AuthenticatedUser);

impl Authenticated {
    /// The caller, without any role check.
    pub fn user(&self) -> &AuthenticatedUser {
        &self.0
    }

    /// The caller, provided their role is one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<&AuthenticatedUser, Error> {
        authorize(&self.0, roles)?;
        Ok(&self.0)
    }

    pub fn into_inner(self) -> AuthenticatedUser {
        self.0
    }
}

/// Pull the token out of an `Authorization: Bearer` header.
///
/// Other schemes and unreadable header values yield `None`.
pub(crate) fn bearer_token(req: &HttpRequest) -> Option<String> {
    let raw = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case(BEARER)
        .then(|| token.trim().to_owned())
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let Some(state) = state else {
                error!("HttpState missing from application data");
                return Err(Error::internal("Internal server error"));
            };
            let user = state.gate.authenticate(token.as_deref()).await?;
            Ok(Self(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::{TestPorts, bearer, state_with};
    use crate::test_support::caller;
    use actix_web::{App, HttpResponse, get, test as actix_test};
    use rstest::rstest;

    #[get("/whoami")]
    async fn whoami(who: Authenticated) -> Result<HttpResponse, Error> {
        let user = who.require(&[Role::Agent, Role::Admin])?;
        Ok(HttpResponse::Ok().body(user.user().name().to_string()))
    }

    #[rstest]
    #[case("Bearer abc.def", Some("abc.def"))]
    #[case("bearer   abc.def  ", Some("abc.def"))]
    #[case("Basic dXNlcjpwYXNz", None)]
    #[case("Bearer", None)]
    fn bearer_token_parsing(#[case] header_value: &str, #[case] expected: Option<&str>) {
        let req = actix_test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, header_value))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), expected);
    }

    #[rstest]
    fn missing_header_yields_no_token() {
        let req = actix_test::TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    async fn call_whoami(
        caller: Option<AuthenticatedUser>,
        header_value: Option<(header::HeaderName, String)>,
    ) -> (u16, String) {
        let state = state_with(TestPorts {
            caller,
            ..TestPorts::default()
        });
        let app = actix_test::init_service(App::new().app_data(state).service(whoami)).await;
        let mut request = actix_test::TestRequest::get().uri("/whoami");
        if let Some(value) = header_value {
            request = request.insert_header(value);
        }
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status().as_u16();
        let body = actix_test::read_body(response).await;
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[actix_web::test]
    async fn staff_callers_pass_the_role_check() {
        let (status, body) =
            call_whoami(Some(caller("Grace Hopper", Role::Agent)), Some(bearer())).await;
        assert_eq!(status, 200);
        assert_eq!(body, "Grace Hopper");
    }

    #[actix_web::test]
    async fn customers_are_forbidden() {
        let (status, body) =
            call_whoami(Some(caller("Casey Customer", Role::Customer)), Some(bearer())).await;
        assert_eq!(status, 403);
        let payload: Error = serde_json::from_str(&body).expect("error payload");
        assert_eq!(payload.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[case(None)]
    #[case(Some((header::AUTHORIZATION, "Bearer someone-elses".to_owned())))]
    #[actix_web::test]
    async fn gate_failures_surface_as_unauthorised(
        #[case] header_value: Option<(header::HeaderName, String)>,
    ) {
        let (status, body) =
            call_whoami(Some(caller("Grace Hopper", Role::Agent)), header_value).await;
        assert_eq!(status, 401);
        let payload: Error = serde_json::from_str(&body).expect("error payload");
        assert_eq!(payload.code(), ErrorCode::Unauthorized);
    }
}
