//! Domain primitives, services and ports.
//!
//! Purpose: define the strongly typed helpdesk model (users, tickets, notes,
//! SLA deadlines and dashboard aggregates) and the services that act on it.
//! Adapters talk to the domain only through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Role, Ticket, Note, TicketStatus, TicketPriority: entities.
//! - SlaPolicy: breach and due date rules.
//! - authorize / AccessControlService: the role gate and bearer resolution.
//! - TicketLifecycleService, TicketAggregationService, DashboardService,
//!   AccountService: driving port implementations.

pub mod ports;

mod access_control;
mod account_service;
mod auth;
mod dashboard;
mod dashboard_service;
mod error;
mod sla;
mod ticket;
mod ticket_lifecycle;
mod trace_id;
mod user;

pub use self::access_control::{AccessControlService, authorize};
pub use self::account_service::AccountService;
pub use self::auth::{
    AuthenticatedUser, CredentialValidationError, IssuedToken, LoginCredentials,
    PASSWORD_MIN_LENGTH, Password, PasswordHash, TokenSubject, UserAccount,
};
pub use self::dashboard::{
    AgentPerformance, DEFAULT_MISSED_SLA_LIMIT, DashboardSlice, MAX_MISSED_SLA_LIMIT,
    MILLIS_PER_DAY, MissedSlaLimit, PriorityBreakdown, PriorityShare, ResolutionSample,
    StatusBreakdown, TicketStats, empty_priority_distribution, priority_distribution,
    summarise_performance,
};
pub use self::dashboard_service::{DashboardService, TicketAggregationService, settle_or_default};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::sla::{
    STANDARD_DUE_WINDOW_DAYS, STANDARD_SLA_WINDOW_DAYS, SlaDeadlines, SlaError, SlaPolicy,
};
pub use self::ticket::{
    NewTicket, Note, TITLE_MAX, Ticket, TicketDraft, TicketId, TicketPriority, TicketStatus,
    TicketTitle, TicketValidationError,
};
pub use self::ticket_lifecycle::TicketLifecycleService;
pub use self::trace_id::TraceId;
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX, EmailAddress, Role, User, UserId,
    UserValidationError,
};
