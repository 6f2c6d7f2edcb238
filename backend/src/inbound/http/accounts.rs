//! Registration, login and profile handlers.
//!
//! ```text
//! POST /api/auth/register {"name":"Ada","email":"ada@example.com","password":"..."}
//! POST /api/auth/login {"email":"ada@example.com","password":"..."}
//! GET  /api/auth/profile
//! PUT  /api/auth/profile {"name":"Ada L."}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::ports::{AuthSession, ProfileUpdate, RegisterRequest};
use crate::domain::{Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/auth/register`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(value_type = String, example = "correct horse battery")]
    pub password: Zeroizing<String>,
}

/// Request body for `POST /api/auth/login`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(value_type = String, example = "correct horse battery")]
    pub password: Zeroizing<String>,
}

/// Request body for `PUT /api/auth/profile`; absent fields are unchanged.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub name: Option<String>,
    pub email: Option<String>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Zeroizing<String>>,
}

/// Bearer token plus the account it was issued for.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token.token,
            expires_at: session.token.expires_at,
            user: session.user,
        }
    }
}

/// Create a customer account and sign it in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterBody,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterBody>,
) -> ApiResult<HttpResponse> {
    let RegisterBody {
        name,
        email,
        password,
    } = payload.into_inner();
    let session = state
        .accounts
        .register(RegisterRequest {
            name,
            email,
            password,
        })
        .await?;
    Ok(HttpResponse::Created().json(AuthResponse::from(session)))
}

/// Exchange credentials for a bearer token.
///
/// Unknown emails and wrong passwords produce the same `401` response.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Login success", body = AuthResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginBody>,
) -> ApiResult<web::Json<AuthResponse>> {
    let body = payload.into_inner();
    let session = state.accounts.login(&body.email, &body.password).await?;
    Ok(web::Json(session.into()))
}

/// The caller's own account.
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "getProfile"
)]
#[get("/auth/profile")]
pub async fn profile(caller: Authenticated) -> web::Json<User> {
    web::Json(caller.into_inner().into_user())
}

/// Change the caller's name, email or password.
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = ProfileBody,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["auth"],
    operation_id = "updateProfile"
)]
#[put("/auth/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<ProfileBody>,
) -> ApiResult<web::Json<User>> {
    let ProfileBody {
        name,
        email,
        password,
    } = payload.into_inner();
    let user = state
        .accounts
        .update_profile(
            caller.user(),
            ProfileUpdate {
                name,
                email,
                password,
            },
        )
        .await?;
    Ok(web::Json(user))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(profile)
        .service(update_profile);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAccountCommand;
    use crate::domain::{IssuedToken, Role};
    use crate::inbound::http::test_utils::{TestPorts, bearer, state_with, str_at};
    use crate::test_support::{caller, epoch, user_with_role};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};

    async fn send(ports: TestPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(state_with(ports))
                .service(web::scope("/api").configure(crate::inbound::http::configure)),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let value = actix_test::read_body_json(response).await;
        (status, value)
    }

    fn session_for(user: User) -> AuthSession {
        AuthSession {
            token: IssuedToken {
                token: "signed.jwt.value".to_owned(),
                expires_at: epoch(),
            },
            user,
        }
    }

    #[actix_web::test]
    async fn register_returns_a_token_and_customer() {
        let user = user_with_role("Casey Customer", Role::Customer);
        let session = session_for(user);
        let mut accounts = MockAccountCommand::new();
        accounts
            .expect_register()
            .withf(|request| {
                request.email == "casey@example.com" && request.password.as_str() == "hunter2hunter2"
            })
            .times(1)
            .return_once(move |_| Ok(session));

        let (status, body) = send(
            TestPorts {
                accounts: Some(accounts),
                ..TestPorts::default()
            },
            actix_test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({
                    "name": "Casey Customer",
                    "email": "casey@example.com",
                    "password": "hunter2hunter2"
                })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(str_at(&body, "/token"), Some("signed.jwt.value"));
        assert_eq!(str_at(&body, "/user/role"), Some("customer"));
        assert!(body.pointer("/user/passwordHash").is_none());
    }

    #[actix_web::test]
    async fn duplicate_registration_is_a_conflict() {
        let mut accounts = MockAccountCommand::new();
        accounts
            .expect_register()
            .return_once(|_| Err(Error::conflict("email already registered")));

        let (status, body) = send(
            TestPorts {
                accounts: Some(accounts),
                ..TestPorts::default()
            },
            actix_test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({
                    "name": "Casey Customer",
                    "email": "casey@example.com",
                    "password": "hunter2hunter2"
                })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(str_at(&body, "/code"), Some("conflict"));
    }

    #[actix_web::test]
    async fn malformed_bodies_are_bad_requests() {
        let (status, body) = send(
            TestPorts::default(),
            actix_test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "casey@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(str_at(&body, "/code"), Some("invalid_request"));
    }

    #[actix_web::test]
    async fn login_failures_are_unauthorised() {
        let mut accounts = MockAccountCommand::new();
        accounts
            .expect_login()
            .withf(|email, password| email == "casey@example.com" && password == "wrong-password")
            .return_once(|_, _| Err(Error::unauthorized("invalid email or password")));

        let (status, body) = send(
            TestPorts {
                accounts: Some(accounts),
                ..TestPorts::default()
            },
            actix_test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "casey@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(str_at(&body, "/message"), Some("invalid email or password"));
    }

    #[actix_web::test]
    async fn profile_returns_the_caller() {
        let actor = caller("Grace Hopper", Role::Agent);
        let (status, body) = send(
            TestPorts {
                caller: Some(actor),
                ..TestPorts::default()
            },
            actix_test::TestRequest::get()
                .uri("/api/auth/profile")
                .insert_header(bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(str_at(&body, "/name"), Some("Grace Hopper"));
        assert_eq!(str_at(&body, "/role"), Some("agent"));
    }

    #[actix_web::test]
    async fn profile_updates_pass_only_present_fields() {
        let actor = caller("Grace Hopper", Role::Agent);
        let renamed = user_with_role("Grace B. Hopper", Role::Agent);
        let mut accounts = MockAccountCommand::new();
        accounts
            .expect_update_profile()
            .withf(|_, update| {
                update.name.as_deref() == Some("Grace B. Hopper")
                    && update.email.is_none()
                    && update.password.is_none()
            })
            .return_once(move |_, _| Ok(renamed));

        let (status, body) = send(
            TestPorts {
                accounts: Some(accounts),
                caller: Some(actor),
                ..TestPorts::default()
            },
            actix_test::TestRequest::put()
                .uri("/api/auth/profile")
                .insert_header(bearer())
                .set_json(json!({ "name": "Grace B. Hopper" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(str_at(&body, "/name"), Some("Grace B. Hopper"));
    }
}
