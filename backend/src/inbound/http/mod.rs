//! HTTP inbound adapter exposing the helpdesk REST endpoints.
//!
//! Handlers translate JSON payloads into driving port calls and map the
//! domain [`Error`](crate::domain::Error) onto status codes in [`error`].
//! Mount [`configure`] under the `/api` scope.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod health;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod users;
mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api` route plus the JSON and query extractor error
/// handlers that keep malformed input inside the error envelope.
///
/// # Examples
///
/// ```no_run
/// use actix_web::{App, web};
///
/// let app = App::new().service(web::scope("/api").configure(helpdesk::inbound::http::configure));
/// # let _ = app;
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    use error::{RequestPart, payload_error};

    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| payload_error(RequestPart::Body, err).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| payload_error(RequestPart::Query, err).into()),
    )
    .configure(accounts::configure)
    .configure(users::configure)
    .configure(tickets::configure);
}
