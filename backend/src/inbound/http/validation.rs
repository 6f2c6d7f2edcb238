//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::{Error, TicketId, UserId};

/// `invalid_request` naming the offending request field.
pub(crate) fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

pub(crate) fn parse_ticket_id(raw: &str) -> Result<TicketId, Error> {
    TicketId::from_str(raw).map_err(Error::from)
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(Error::from)
}

/// Parse an optional wire value into a domain enum.
pub(crate) fn parse_optional<T>(value: Option<String>) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: Into<Error>,
{
    value
        .map(|raw| raw.parse::<T>().map_err(Into::into))
        .transpose()
}

/// Deserialise a present field as `Some`, even when it is `null`.
///
/// Paired with `#[serde(default)]` this tells an absent field (`None`) apart
/// from an explicit `null` (`Some(None)`).
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
