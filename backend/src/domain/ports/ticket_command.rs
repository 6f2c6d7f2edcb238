//! Driving ports for ticket lifecycle mutations and reads.
//!
//! Inbound adapters pass the authenticated caller explicitly; the service
//! decides what that caller may see or change.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{
    AuthenticatedUser, Error, Ticket, TicketId, TicketPriority, TicketStatus, UserId,
};

/// Input for opening a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
}

/// Partial update applied in a single write.
///
/// `assigned_agent` distinguishes "leave as is" (`None`) from "unassign"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assigned_agent: Option<Option<UserId>>,
}

/// Input for appending a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddNoteRequest {
    pub text: String,
    pub attachment: Option<String>,
}

/// A ticket plus the names of every user it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDetails {
    pub ticket: Ticket,
    pub names: HashMap<UserId, String>,
}

impl TicketDetails {
    /// Display name for a referenced user, if it could be resolved.
    pub fn name_of(&self, id: &UserId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }
}

/// Ticket mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketCommand: Send + Sync {
    /// Open a ticket owned by `actor`.
    async fn create_ticket(
        &self,
        actor: &AuthenticatedUser,
        request: CreateTicketRequest,
    ) -> Result<TicketDetails, Error>;

    /// Move a ticket to a new status.
    async fn update_status(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<TicketDetails, Error>;

    /// Apply status, priority and assignment changes together.
    async fn update_ticket(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
        request: UpdateTicketRequest,
    ) -> Result<TicketDetails, Error>;

    /// Append a note authored by `actor`.
    async fn add_note(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
        request: AddNoteRequest,
    ) -> Result<TicketDetails, Error>;

    /// Irreversibly remove a ticket and its notes.
    async fn delete_ticket(&self, actor: &AuthenticatedUser, id: TicketId) -> Result<(), Error>;
}

/// Ticket reads scoped to what the caller may see.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketQuery: Send + Sync {
    /// Fetch one ticket with names resolved.
    async fn get_ticket(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
    ) -> Result<TicketDetails, Error>;

    /// List visible tickets, most recently updated first.
    async fn list_tickets(&self, actor: &AuthenticatedUser) -> Result<Vec<TicketDetails>, Error>;
}
