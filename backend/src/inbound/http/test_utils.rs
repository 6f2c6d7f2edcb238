//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::web;
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ports::{
    AccessGate, MockAccountCommand, MockDashboardQuery, MockTicketCommand, MockTicketQuery,
    MockUserAdministration,
};
use crate::domain::{AuthenticatedUser, Error};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// The only bearer token [`StubGate`] accepts.
pub const TEST_TOKEN: &str = "test-token";

/// Gate that resolves [`TEST_TOKEN`] to a fixed caller.
pub struct StubGate {
    caller: Option<AuthenticatedUser>,
}

#[async_trait]
impl AccessGate for StubGate {
    async fn authenticate(&self, token: Option<&str>) -> Result<AuthenticatedUser, Error> {
        match (token, &self.caller) {
            (None, _) => Err(Error::unauthorized("not authorized: no token")),
            (Some(TEST_TOKEN), Some(caller)) => Ok(caller.clone()),
            (Some(_), _) => Err(Error::unauthorized("not authorized: token failed")),
        }
    }
}

/// Mocks to install in [`HttpState`]; anything left `None` has no
/// expectations and panics if called.
#[derive(Default)]
pub struct TestPorts {
    pub tickets: Option<MockTicketCommand>,
    pub ticket_query: Option<MockTicketQuery>,
    pub dashboard: Option<MockDashboardQuery>,
    pub accounts: Option<MockAccountCommand>,
    pub users: Option<MockUserAdministration>,
    pub caller: Option<AuthenticatedUser>,
}

/// Build shared state from mocks.
pub fn state_with(ports: TestPorts) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(HttpStatePorts {
        tickets: Arc::new(ports.tickets.unwrap_or_default()),
        ticket_query: Arc::new(ports.ticket_query.unwrap_or_default()),
        dashboard: Arc::new(ports.dashboard.unwrap_or_default()),
        accounts: Arc::new(ports.accounts.unwrap_or_default()),
        users: Arc::new(ports.users.unwrap_or_default()),
        gate: Arc::new(StubGate {
            caller: ports.caller,
        }),
    }))
}

/// `Authorization` header carrying [`TEST_TOKEN`].
pub fn bearer() -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
}

/// Read `pointer` from a JSON body as a string.
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}
