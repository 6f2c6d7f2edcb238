//! Ticket aggregate: status and priority enums, embedded notes and the
//! status transition table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Error;
use super::sla::SlaDeadlines;
use super::user::UserId;

/// Maximum length of a ticket title, in characters.
pub const TITLE_MAX: usize = 200;

/// Validation failures raised while building or mutating tickets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("note text must not be empty")]
    EmptyNoteText,
    #[error("status must be one of open, in-progress, closed, on-hold")]
    UnknownStatus,
    #[error("priority must be one of low, medium, high, critical")]
    UnknownPriority,
    #[error("cannot move ticket from {from} to {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },
    #[error("closed tickets do not accept notes")]
    TicketClosed,
    #[error("ticket id must be a valid UUID")]
    InvalidId,
}

impl TicketValidationError {
    fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyNoteText => "text",
            Self::UnknownStatus | Self::InvalidTransition { .. } => "status",
            Self::UnknownPriority => "priority",
            Self::TicketClosed => "ticket",
            Self::InvalidId => "id",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "empty_title",
            Self::TitleTooLong { .. } => "title_too_long",
            Self::EmptyNoteText => "empty_note",
            Self::UnknownStatus => "unknown_status",
            Self::UnknownPriority => "unknown_priority",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::TicketClosed => "ticket_closed",
            Self::InvalidId => "invalid_id",
        }
    }
}

impl From<TicketValidationError> for Error {
    fn from(err: TicketValidationError) -> Self {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": err.field(), "code": err.code() }))
    }
}

/// Stable ticket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TicketId {
    type Err = TicketValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TicketValidationError::InvalidId)
    }
}

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
    OnHold,
}

impl TicketStatus {
    /// Every status, in reporting order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Closed, Self::OnHold];

    /// Wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Closed => "closed",
            Self::OnHold => "on-hold",
        }
    }

    /// Statuses reachable from `self` in one step, besides `self`.
    ///
    /// Closed tickets may only be reopened.
    pub fn allowed_transitions(self) -> &'static [TicketStatus] {
        match self {
            Self::Open => &[Self::InProgress, Self::OnHold, Self::Closed],
            Self::InProgress => &[Self::Open, Self::OnHold, Self::Closed],
            Self::OnHold => &[Self::Open, Self::InProgress, Self::Closed],
            Self::Closed => &[Self::Open],
        }
    }

    /// Whether the transition table permits moving to `next`.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        self == next || self.allowed_transitions().contains(&next)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = TicketValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(TicketValidationError::UnknownStatus)
    }
}

/// Urgency of a ticket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Capitalised label used by dashboard charts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = TicketValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or(TicketValidationError::UnknownPriority)
    }
}

/// Trimmed, non-empty ticket title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTitle(String);

impl TicketTitle {
    /// Validate a raw title.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TicketValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(TicketValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for TicketTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Append-only comment embedded in a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    id: Uuid,
    author: UserId,
    text: String,
    attachment: Option<String>,
    created_at: DateTime<Utc>,
}

impl Note {
    /// Build a note, rejecting blank text.
    pub fn new(
        id: Uuid,
        author: UserId,
        text: impl AsRef<str>,
        attachment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TicketValidationError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(TicketValidationError::EmptyNoteText);
        }
        Ok(Self {
            id,
            author,
            text: text.to_owned(),
            attachment: attachment.filter(|value| !value.trim().is_empty()),
            created_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn author(&self) -> &UserId {
        &self.author
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input describing a ticket about to be opened.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub customer: UserId,
    pub title: TicketTitle,
    pub description: String,
    pub priority: TicketPriority,
}

/// Full field set used to rehydrate a stored ticket.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub customer: UserId,
    pub assigned_agent: Option<UserId>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub sla_breach_date: DateTime<Utc>,
    pub notes: Vec<Note>,
}

/// Support ticket owned by a customer.
///
/// ## Invariants
/// - `sla_breach_date` and `due_date` are fixed at creation.
/// - Every mutation moves `updated_at` to the mutation time.
/// - Closed tickets reject new notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    id: TicketId,
    title: TicketTitle,
    description: String,
    customer: UserId,
    assigned_agent: Option<UserId>,
    status: TicketStatus,
    priority: TicketPriority,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    due_date: DateTime<Utc>,
    sla_breach_date: DateTime<Utc>,
    notes: Vec<Note>,
}

impl Ticket {
    /// Open a new ticket in the `open` state.
    pub fn open(
        id: TicketId,
        input: NewTicket,
        created_at: DateTime<Utc>,
        deadlines: SlaDeadlines,
    ) -> Self {
        let NewTicket {
            customer,
            title,
            description,
            priority,
        } = input;
        Self {
            id,
            title,
            description,
            customer,
            assigned_agent: None,
            status: TicketStatus::Open,
            priority,
            created_at,
            updated_at: created_at,
            due_date: deadlines.due_date,
            sla_breach_date: deadlines.sla_breach_date,
            notes: Vec::new(),
        }
    }

    /// Rebuild a ticket from stored fields.
    pub fn from_draft(draft: TicketDraft) -> Result<Self, TicketValidationError> {
        let TicketDraft {
            id,
            title,
            description,
            customer,
            assigned_agent,
            status,
            priority,
            created_at,
            updated_at,
            due_date,
            sla_breach_date,
            notes,
        } = draft;
        Ok(Self {
            id,
            title: TicketTitle::new(title)?,
            description,
            customer,
            assigned_agent,
            status,
            priority,
            created_at,
            updated_at,
            due_date,
            sla_breach_date,
            notes,
        })
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_ref()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn customer(&self) -> &UserId {
        &self.customer
    }

    pub fn assigned_agent(&self) -> Option<&UserId> {
        self.assigned_agent.as_ref()
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub fn priority(&self) -> TicketPriority {
        self.priority
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    pub fn sla_breach_date(&self) -> DateTime<Utc> {
        self.sla_breach_date
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Whether the ticket is still open past its breach date.
    pub fn has_missed_sla(&self, now: DateTime<Utc>) -> bool {
        self.status != TicketStatus::Closed && self.sla_breach_date < now
    }

    /// Move to `next`, consulting the transition table.
    pub fn transition_to(
        &mut self,
        next: TicketStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TicketValidationError> {
        if !self.status.can_transition_to(next) {
            return Err(TicketValidationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Change the priority.
    pub fn reprioritise(&mut self, priority: TicketPriority, now: DateTime<Utc>) {
        self.priority = priority;
        self.updated_at = now;
    }

    /// Assign or unassign the handling agent.
    pub fn assign(&mut self, agent: Option<UserId>, now: DateTime<Utc>) {
        self.assigned_agent = agent;
        self.updated_at = now;
    }

    /// Append a note stamped at its own creation time.
    pub fn append_note(&mut self, note: Note) -> Result<(), TicketValidationError> {
        if self.status == TicketStatus::Closed {
            return Err(TicketValidationError::TicketClosed);
        }
        self.updated_at = note.created_at();
        self.notes.push(note);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
