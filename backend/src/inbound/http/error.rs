//! Rendering of domain [`Error`]s as HTTP responses.
//!
//! The status follows the error code. Internal failures are logged here,
//! keyed by trace id, and only a generic message reaches the client. A `401`
//! carries a bearer challenge so clients know to fetch a token from
//! `/api/auth/login`.

use std::borrow::Cow;
use std::fmt::Display;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Handler result carrying the domain error.
pub type ApiResult<T> = Result<T, Error>;

const GENERIC_INTERNAL: &str = "Internal server error";
const BEARER_CHALLENGE: &str = r#"Bearer realm="helpdesk""#;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The part of `error` a client may see. Client errors pass through as-is;
/// internal ones keep only their trace id.
fn client_view(error: &Error) -> Cow<'_, Error> {
    if error.code() != ErrorCode::InternalError {
        return Cow::Borrowed(error);
    }
    error!(
        trace_id = error.trace_id().unwrap_or("-"),
        cause = error.message(),
        "responding with internal error"
    );
    let generic = Error::internal(GENERIC_INTERNAL);
    Cow::Owned(match error.trace_id() {
        Some(id) => generic.with_trace_id(id.to_owned()),
        None => generic,
    })
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        if self.code() == ErrorCode::Unauthorized {
            response.insert_header((header::WWW_AUTHENTICATE, BEARER_CHALLENGE));
        }
        response.json(client_view(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced from a handler");
        Error::internal(GENERIC_INTERNAL)
    }
}

/// Where a rejected request part came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestPart {
    Body,
    Query,
}

/// Map extractor failures onto `invalid_request`, naming the offending part.
pub(crate) fn payload_error(part: RequestPart, err: impl Display) -> Error {
    let (label, code) = match part {
        RequestPart::Body => ("request body", "malformed_body"),
        RequestPart::Query => ("query string", "malformed_query"),
    };
    Error::invalid_request(format!("malformed {label}: {err}"))
        .with_details(json!({ "code": code }))
}

#[cfg(test)]
mod tests;
