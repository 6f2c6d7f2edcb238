//! Helpdesk backend library.
//!
//! `domain` holds the ticket and account model plus its ports; `inbound`
//! and `outbound` hold the HTTP handlers and the storage and security
//! adapters. The binary in `main.rs` wires them together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
