//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api` handler, the health probes and the
//! schemas they reference, plus the bearer token security scheme. The
//! document backs Swagger UI in debug builds and `openapi-dump`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    AgentPerformance, DashboardSlice, Error, ErrorCode, PriorityBreakdown, PriorityShare, Role,
    StatusBreakdown, TicketPriority, TicketStats, TicketStatus, User,
};
use crate::inbound::http::accounts::{AuthResponse, LoginBody, ProfileBody, RegisterBody};
use crate::inbound::http::health::{Phase, ProbeReport};
use crate::inbound::http::tickets::{
    CreateTicketBody, DashboardResponse, NoteBody, NoteResponse, TicketResponse, UpdateTicketBody,
    UserRef,
};
use crate::inbound::http::users::{CreateUserBody, UpdateUserBody};

/// Scheme name referenced by the document-level `security` requirement.
pub const BEARER_SCHEME: &str = "BearerAuth";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token returned by POST /api/auth/login or /api/auth/register.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the helpdesk REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Helpdesk API",
        description = "Ticket lifecycle, SLA dashboard and account management."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::profile,
        crate::inbound::http::accounts::update_profile,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::ticket_stats,
        crate::inbound::http::tickets::priority_distribution,
        crate::inbound::http::tickets::user_performance,
        crate::inbound::http::tickets::missed_sla_tickets,
        crate::inbound::http::tickets::dashboard,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::update_ticket,
        crate::inbound::http::tickets::add_note,
        crate::inbound::http::tickets::delete_ticket,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        TicketStatus,
        TicketPriority,
        TicketStats,
        StatusBreakdown,
        PriorityBreakdown,
        PriorityShare,
        AgentPerformance,
        DashboardSlice,
        UserRef,
        NoteResponse,
        TicketResponse,
        DashboardResponse,
        CreateTicketBody,
        UpdateTicketBody,
        NoteBody,
        RegisterBody,
        LoginBody,
        ProfileBody,
        AuthResponse,
        CreateUserBody,
        UpdateUserBody,
        Phase,
        ProbeReport,
    )),
    tags(
        (name = "auth", description = "Registration, login and the caller's profile"),
        (name = "users", description = "Admin user management"),
        (name = "tickets", description = "Ticket lifecycle and notes"),
        (name = "dashboard", description = "SLA and workload aggregates"),
        (name = "health", description = "Liveness and store-backed readiness")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("Error", "code")]
    #[case("Error", "message")]
    #[case("User", "email")]
    #[case("TicketResponse", "slaBreachDate")]
    #[case("TicketResponse", "assignedAgent")]
    #[case("DashboardResponse", "degradedSlices")]
    fn schemas_expose_wire_field_names(#[case] schema: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let found = schemas
            .get(schema)
            .unwrap_or_else(|| panic!("{schema} schema registered"));
        assert_object_schema_has_field(found, field);
    }

    #[rstest]
    #[case("/api/tickets")]
    #[case("/api/tickets/{id}")]
    #[case("/api/tickets/{id}/notes")]
    #[case("/api/tickets/dashboard")]
    #[case("/api/auth/login")]
    #[case("/api/users/{id}")]
    #[case("/health/ready")]
    fn documents_every_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[test]
    fn registers_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key(BEARER_SCHEME));
    }
}
