//! Tests for HTTP error mapping.

use super::*;
use crate::domain::Error;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("connection refused by 10.0.0.4")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn invalid_request_case(expected_trace_id: String) -> Error {
    Error::invalid_request("title must not be empty")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"field": "title", "code": "empty_title"}))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("email already registered"), StatusCode::CONFLICT)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
    assert_eq!(status_for(err.code()), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id not valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(internal_error_case: Error, expected_trace_id: String) {
    let redacted = assert_error_response(
        internal_error_case,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), "Internal server error");
    assert!(redacted.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn validation_errors_keep_their_details(
    invalid_request_case: Error,
    expected_trace_id: String,
) {
    let payload = assert_error_response(
        invalid_request_case,
        StatusCode::BAD_REQUEST,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.message(), "title must not be empty");
    assert_eq!(
        payload.details(),
        Some(&json!({"field": "title", "code": "empty_title"}))
    );
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::conflict("email already registered");

    let payload = assert_error_response(error, StatusCode::CONFLICT, None).await;
    assert_eq!(payload.code(), ErrorCode::Conflict);
    assert_eq!(payload.trace_id(), None);
}

#[rstest]
fn client_errors_are_passed_through_unchanged() {
    let error = Error::forbidden("role customer is not permitted to perform this action");
    assert!(matches!(client_view(&error), Cow::Borrowed(_)));
    assert_eq!(client_view(&error).as_ref(), &error);
}

#[rstest]
#[case(RequestPart::Body, "malformed request body", "malformed_body")]
#[case(RequestPart::Query, "malformed query string", "malformed_query")]
fn payload_errors_name_the_rejected_part(
    #[case] part: RequestPart,
    #[case] prefix: &str,
    #[case] code: &str,
) {
    let err = payload_error(part, "missing field `title`");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(err.message().starts_with(prefix), "{}", err.message());
    assert_eq!(err.details(), Some(&json!({ "code": code })));
}

#[rstest]
#[case(Error::unauthorized("invalid email or password"), true)]
#[case(Error::forbidden("admins only"), false)]
fn only_unauthorised_responses_carry_a_bearer_challenge(
    #[case] error: Error,
    #[case] challenged: bool,
) {
    let response = ResponseError::error_response(&error);
    let challenge = response
        .headers()
        .get(actix_web::http::header::WWW_AUTHENTICATE)
        .and_then(|value| value.to_str().ok());
    assert_eq!(challenge, challenged.then_some(BEARER_CHALLENGE));
}

#[rstest]
fn from_actix_error_is_redacted_internal_error() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.trace_id(), None);
    assert_eq!(err.details(), None);
}
