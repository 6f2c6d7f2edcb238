//! Admin user management handlers.
//!
//! ```text
//! GET    /api/users
//! POST   /api/users {"name":"Grace","email":"grace@example.com","password":"...","role":"agent"}
//! GET    /api/users/{id}
//! PUT    /api/users/{id} {"name":"Grace Hopper"}
//! DELETE /api/users/{id}
//! ```
//!
//! Every route requires the `admin` role.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::ports::{CreateUserRequest, UserUpdate};
use crate::domain::{Error, Role, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_user_id;

const ADMIN: &[Role] = &[Role::Admin];

/// Request body for `POST /api/users`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    #[schema(example = "Grace Hopper")]
    pub name: String,
    #[schema(example = "grace@example.com")]
    pub email: String,
    #[schema(value_type = String)]
    pub password: Zeroizing<String>,
    #[schema(example = "agent")]
    pub role: String,
}

/// Request body for `PUT /api/users/{id}`. The role cannot be changed.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// List every account.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<User>>> {
    caller.require(ADMIN)?;
    Ok(web::Json(state.users.list_users().await?))
}

/// Create an account with any role.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateUserBody>,
) -> ApiResult<HttpResponse> {
    caller.require(ADMIN)?;
    let CreateUserBody {
        name,
        email,
        password,
        role,
    } = payload.into_inner();
    let role = role.parse::<Role>().map_err(Error::from)?;
    let user = state
        .users
        .create_user(CreateUserRequest {
            name,
            email,
            password,
            role,
        })
        .await?;
    Ok(HttpResponse::Created().json(user))
}

/// Fetch one account.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    caller.require(ADMIN)?;
    let id = parse_user_id(&path)?;
    Ok(web::Json(state.users.get_user(&id).await?))
}

/// Rename an account or change its email.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateUserBody>,
) -> ApiResult<web::Json<User>> {
    caller.require(ADMIN)?;
    let id = parse_user_id(&path)?;
    let UpdateUserBody { name, email } = payload.into_inner();
    let user = state
        .users
        .update_user(&id, UserUpdate { name, email })
        .await?;
    Ok(web::Json(user))
}

/// Remove an account that no ticket or note still references.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Invalid identifier or self-deletion", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "User still referenced", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = caller.require(ADMIN)?;
    let id = parse_user_id(&path)?;
    state.users.delete_user(actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(create_user)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}
