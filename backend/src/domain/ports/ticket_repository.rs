//! Port for ticket persistence and the grouped reads behind the dashboard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ResolutionSample, Ticket, TicketId, TicketPriority, TicketStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ticket repository adapters.
    pub enum TicketRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ticket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ticket repository query failed: {message}",
    }
}

/// Restricts which tickets a listing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketListFilter {
    /// Only tickets owned by this customer, when set.
    pub customer: Option<UserId>,
}

/// Port for reading and writing tickets with their embedded notes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Store a newly opened ticket and its notes.
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError>;

    /// Overwrite an existing ticket. Notes are append-only: stored notes are
    /// kept and unseen ones added. Returns `false` when the ticket no longer
    /// exists; nothing is written in that case.
    async fn update(&self, ticket: &Ticket) -> Result<bool, TicketRepositoryError>;

    /// Fetch a ticket with its notes.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError>;

    /// List tickets, most recently updated first.
    async fn list(&self, filter: &TicketListFilter) -> Result<Vec<Ticket>, TicketRepositoryError>;

    /// Remove a ticket and its notes. Returns `false` when nothing matched.
    async fn delete(&self, id: &TicketId) -> Result<bool, TicketRepositoryError>;

    /// Ticket counts grouped by status; absent groups may be omitted.
    async fn count_by_status(&self) -> Result<Vec<(TicketStatus, u64)>, TicketRepositoryError>;

    /// Ticket counts grouped by priority; absent groups may be omitted.
    async fn count_by_priority(&self)
    -> Result<Vec<(TicketPriority, u64)>, TicketRepositoryError>;

    /// Closed tickets with an assigned agent, joined with the agent's name.
    async fn closed_resolutions(&self) -> Result<Vec<ResolutionSample>, TicketRepositoryError>;

    /// Non-closed tickets whose breach date precedes `now`, earliest breach
    /// first, at most `limit` rows.
    async fn overdue(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Ticket>, TicketRepositoryError>;
}
