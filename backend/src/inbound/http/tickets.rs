//! Ticket lifecycle and dashboard HTTP handlers.
//!
//! ```text
//! POST   /api/tickets
//! GET    /api/tickets
//! GET    /api/tickets/stats
//! GET    /api/tickets/priority-distribution
//! GET    /api/tickets/user-performance
//! GET    /api/tickets/missed-sla-tickets?limit=10
//! GET    /api/tickets/dashboard?limit=10
//! GET    /api/tickets/{id}
//! PUT    /api/tickets/{id}
//! POST   /api/tickets/{id}/notes
//! DELETE /api/tickets/{id}
//! ```
//!
//! The fixed dashboard paths are registered ahead of `/tickets/{id}` so they
//! are never captured as ticket identifiers.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    AddNoteRequest, CreateTicketRequest, DashboardSnapshot, TicketDetails, UpdateTicketRequest,
};
use crate::domain::{
    AgentPerformance, DashboardSlice, Error, MissedSlaLimit, Note, PriorityShare, Role, Ticket,
    TicketPriority, TicketStats, TicketStatus, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    invalid_field, parse_optional, parse_ticket_id, parse_user_id, present,
};

const STAFF: &[Role] = &[Role::Agent, Role::Admin];
const TICKET_OPENERS: &[Role] = &[Role::Customer, Role::Admin];

/// A referenced user with their display name when it could be resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
}

impl UserRef {
    fn resolve(id: &UserId, details: &TicketDetails) -> Self {
        Self {
            id: id.to_string(),
            name: details.name_of(id).map(str::to_owned),
        }
    }
}

/// A note as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub author: UserRef,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NoteResponse {
    fn from_note(note: &Note, details: &TicketDetails) -> Self {
        Self {
            id: note.id().to_string(),
            author: UserRef::resolve(note.author(), details),
            text: note.text().to_owned(),
            attachment: note.attachment().map(str::to_owned),
            created_at: note.created_at(),
        }
    }
}

/// A ticket as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub customer: UserRef,
    pub assigned_agent: Option<UserRef>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub sla_breach_date: DateTime<Utc>,
    pub notes: Vec<NoteResponse>,
}

impl From<TicketDetails> for TicketResponse {
    fn from(details: TicketDetails) -> Self {
        let ticket = &details.ticket;
        Self {
            id: ticket.id().to_string(),
            title: ticket.title().to_owned(),
            description: ticket.description().to_owned(),
            customer: UserRef::resolve(ticket.customer(), &details),
            assigned_agent: ticket
                .assigned_agent()
                .map(|agent| UserRef::resolve(agent, &details)),
            status: ticket.status(),
            priority: ticket.priority(),
            created_at: ticket.created_at(),
            updated_at: ticket.updated_at(),
            due_date: ticket.due_date(),
            sla_breach_date: ticket.sla_breach_date(),
            notes: ticket
                .notes()
                .iter()
                .map(|note| NoteResponse::from_note(note, &details))
                .collect(),
        }
    }
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        TicketDetails {
            ticket,
            names: Default::default(),
        }
        .into()
    }
}

/// Request body for `POST /api/tickets`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketBody {
    #[serde(default)]
    #[schema(example = "Printer broken")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "high")]
    pub priority: Option<String>,
}

/// Request body for `PUT /api/tickets/{id}`.
///
/// A body carrying only `status` is a plain status change. `assignedAgent`
/// set to `null` unassigns the ticket.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketBody {
    #[schema(example = "in-progress")]
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub assigned_agent: Option<Option<String>>,
}

/// Request body for `POST /api/tickets/{id}/notes`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteBody {
    #[serde(default)]
    #[schema(example = "Restarted the spooler")]
    pub text: String,
    pub attachment: Option<String>,
}

/// Query string for the missed-SLA report.
#[derive(Debug, Deserialize, IntoParams)]
pub struct MissedSlaParams {
    /// Maximum number of tickets, 1 to 100. Defaults to 10.
    pub limit: Option<u32>,
}

impl MissedSlaParams {
    fn limit(&self) -> Result<MissedSlaLimit, Error> {
        self.limit
            .map(MissedSlaLimit::new)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// Every dashboard slice plus the ones that fell back to defaults.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: TicketStats,
    pub priority_distribution: Vec<PriorityShare>,
    pub user_performance: Vec<AgentPerformance>,
    pub missed_sla_tickets: Vec<TicketResponse>,
    pub degraded_slices: Vec<DashboardSlice>,
}

impl From<DashboardSnapshot> for DashboardResponse {
    fn from(snapshot: DashboardSnapshot) -> Self {
        Self {
            stats: snapshot.stats,
            priority_distribution: snapshot.priority_distribution,
            user_performance: snapshot.user_performance,
            missed_sla_tickets: snapshot
                .missed_sla_tickets
                .into_iter()
                .map(TicketResponse::from)
                .collect(),
            degraded_slices: snapshot.degraded,
        }
    }
}

/// Open a ticket owned by the caller.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketBody,
    responses(
        (status = 201, description = "Ticket opened", body = TicketResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateTicketBody>,
) -> ApiResult<HttpResponse> {
    let actor = caller.require(TICKET_OPENERS)?;
    let body = payload.into_inner();
    let request = CreateTicketRequest {
        title: body.title,
        description: body.description,
        priority: parse_optional(body.priority)?,
    };
    let details = state.tickets.create_ticket(actor, request).await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(details)))
}

/// List tickets visible to the caller, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/tickets",
    responses(
        (status = 200, description = "Tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let tickets = state.ticket_query.list_tickets(caller.user()).await?;
    Ok(web::Json(
        tickets.into_iter().map(TicketResponse::from).collect(),
    ))
}

/// Ticket totals by status and by priority.
#[utoipa::path(
    get,
    path = "/api/tickets/stats",
    responses(
        (status = 200, description = "Zero-filled totals", body = TicketStats),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "getTicketStats"
)]
#[get("/tickets/stats")]
pub async fn ticket_stats(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<TicketStats>> {
    caller.require(STAFF)?;
    Ok(web::Json(state.dashboard.stats().await))
}

/// Share of tickets per priority level.
#[utoipa::path(
    get,
    path = "/api/tickets/priority-distribution",
    responses(
        (status = 200, description = "Priority shares, lowest first", body = [PriorityShare]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "getPriorityDistribution"
)]
#[get("/tickets/priority-distribution")]
pub async fn priority_distribution(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<PriorityShare>>> {
    caller.require(STAFF)?;
    Ok(web::Json(state.dashboard.priority_distribution().await))
}

/// Resolution throughput per agent.
#[utoipa::path(
    get,
    path = "/api/tickets/user-performance",
    responses(
        (status = 200, description = "Agents with closed tickets", body = [AgentPerformance]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "getUserPerformance"
)]
#[get("/tickets/user-performance")]
pub async fn user_performance(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<AgentPerformance>>> {
    caller.require(STAFF)?;
    Ok(web::Json(state.dashboard.user_performance().await))
}

/// Open tickets past their SLA breach date, oldest breach first.
#[utoipa::path(
    get,
    path = "/api/tickets/missed-sla-tickets",
    params(MissedSlaParams),
    responses(
        (status = 200, description = "Breached tickets", body = [TicketResponse]),
        (status = 400, description = "Limit out of range", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "getMissedSlaTickets"
)]
#[get("/tickets/missed-sla-tickets")]
pub async fn missed_sla_tickets(
    state: web::Data<HttpState>,
    caller: Authenticated,
    params: web::Query<MissedSlaParams>,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    caller.require(STAFF)?;
    let limit = params.limit()?;
    let tickets = state.dashboard.missed_sla_tickets(limit).await;
    Ok(web::Json(
        tickets.into_iter().map(TicketResponse::from).collect(),
    ))
}

/// All dashboard slices, gathered concurrently.
#[utoipa::path(
    get,
    path = "/api/tickets/dashboard",
    params(MissedSlaParams),
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardResponse),
        (status = 400, description = "Limit out of range", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "getDashboard"
)]
#[get("/tickets/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    caller: Authenticated,
    params: web::Query<MissedSlaParams>,
) -> ApiResult<web::Json<DashboardResponse>> {
    caller.require(STAFF)?;
    let limit = params.limit()?;
    let snapshot = state.dashboard.snapshot(limit).await;
    Ok(web::Json(snapshot.into()))
}

/// Fetch one ticket.
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = String, Path, description = "Ticket identifier")),
    responses(
        (status = 200, description = "Ticket", body = TicketResponse),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a participant", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<TicketResponse>> {
    let id = parse_ticket_id(&path)?;
    let details = state.ticket_query.get_ticket(caller.user(), id).await?;
    Ok(web::Json(details.into()))
}

/// Change status, priority or assignment.
#[utoipa::path(
    put,
    path = "/api/tickets/{id}",
    params(("id" = String, Path, description = "Ticket identifier")),
    request_body = UpdateTicketBody,
    responses(
        (status = 200, description = "Updated ticket", body = TicketResponse),
        (status = 400, description = "Invalid request or transition", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "updateTicket"
)]
#[put("/tickets/{id}")]
pub async fn update_ticket(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateTicketBody>,
) -> ApiResult<web::Json<TicketResponse>> {
    let id = parse_ticket_id(&path)?;
    let body = payload.into_inner();
    let status = parse_optional::<TicketStatus>(body.status)?;
    let priority = parse_optional::<TicketPriority>(body.priority)?;
    let assigned_agent = body
        .assigned_agent
        .map(|agent| {
            agent
                .map(|raw| {
                    parse_user_id(&raw).map_err(|_| {
                        invalid_field(
                            "assignedAgent",
                            "invalid_id",
                            "assignedAgent must be a valid UUID",
                        )
                    })
                })
                .transpose()
        })
        .transpose()?;

    let status_only = priority.is_none() && assigned_agent.is_none();
    let details = match status {
        Some(status) if status_only => {
            state
                .tickets
                .update_status(caller.user(), id, status)
                .await?
        }
        _ => {
            let request = UpdateTicketRequest {
                status,
                priority,
                assigned_agent,
            };
            state
                .tickets
                .update_ticket(caller.user(), id, request)
                .await?
        }
    };
    Ok(web::Json(details.into()))
}

/// Append a note authored by the caller.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/notes",
    params(("id" = String, Path, description = "Ticket identifier")),
    request_body = NoteBody,
    responses(
        (status = 201, description = "Ticket with the new note", body = TicketResponse),
        (status = 400, description = "Blank note or closed ticket", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a participant", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "addNote"
)]
#[post("/tickets/{id}/notes")]
pub async fn add_note(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<NoteBody>,
) -> ApiResult<HttpResponse> {
    let id = parse_ticket_id(&path)?;
    let body = payload.into_inner();
    let request = AddNoteRequest {
        text: body.text,
        attachment: body.attachment,
    };
    let details = state.tickets.add_note(caller.user(), id, request).await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(details)))
}

/// Remove a ticket and its notes.
#[utoipa::path(
    delete,
    path = "/api/tickets/{id}",
    params(("id" = String, Path, description = "Ticket identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "deleteTicket"
)]
#[delete("/tickets/{id}")]
pub async fn delete_ticket(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = caller.require(&[Role::Admin])?;
    let id = parse_ticket_id(&path)?;
    state.tickets.delete_ticket(actor, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register ticket routes, fixed paths first.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_ticket)
        .service(list_tickets)
        .service(ticket_stats)
        .service(priority_distribution)
        .service(user_performance)
        .service(missed_sla_tickets)
        .service(dashboard)
        .service(get_ticket)
        .service(update_ticket)
        .service(add_note)
        .service(delete_ticket);
}

#[cfg(test)]
#[path = "tickets_tests.rs"]
mod tests;
