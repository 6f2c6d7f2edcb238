//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    DisplayName, EmailAddress, Note, PasswordHash, Role, Ticket, TicketDraft, TicketId,
    TicketPriority, TicketStatus, User, UserAccount, UserId,
};

use super::schema::{ticket_notes, tickets, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

impl UserRow {
    pub fn into_user(self) -> Result<User, String> {
        Ok(User::new(
            UserId::from_uuid(self.id),
            DisplayName::new(self.name).map_err(|err| err.to_string())?,
            EmailAddress::new(self.email).map_err(|err| err.to_string())?,
            Role::from_str(&self.role).map_err(|err| err.to_string())?,
        ))
    }

    pub fn into_account(self) -> Result<UserAccount, String> {
        let password_hash = PasswordHash::new(self.password_hash.clone());
        Ok(UserAccount {
            user: self.into_user()?,
            password_hash,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub role: &'a str,
    pub password_hash: &'a str,
}

impl<'a> NewUserRow<'a> {
    pub fn from_account(account: &'a UserAccount) -> Self {
        Self {
            id: *account.user.id().as_uuid(),
            name: account.user.name().as_ref(),
            email: account.user.email().as_ref(),
            role: account.user.role().as_str(),
            password_hash: account.password_hash.as_str(),
        }
    }
}

/// Profile columns touched by self-service and admin edits.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserProfileChangeset<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
    pub assigned_agent_id: Option<Uuid>,
    pub status: String,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub sla_breach_date: DateTime<Utc>,
}

impl TicketRow {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            id: *ticket.id().as_uuid(),
            title: ticket.title().to_owned(),
            description: ticket.description().to_owned(),
            customer_id: *ticket.customer().as_uuid(),
            assigned_agent_id: ticket.assigned_agent().map(|agent| *agent.as_uuid()),
            status: ticket.status().as_str().to_owned(),
            priority: ticket.priority().as_str().to_owned(),
            created_at: ticket.created_at(),
            updated_at: ticket.updated_at(),
            due_date: ticket.due_date(),
            sla_breach_date: ticket.sla_breach_date(),
        }
    }

    pub fn into_ticket(self, notes: Vec<NoteRow>) -> Result<Ticket, String> {
        let notes = notes
            .into_iter()
            .map(NoteRow::into_note)
            .collect::<Result<Vec<_>, _>>()?;
        Ticket::from_draft(TicketDraft {
            id: TicketId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            customer: UserId::from_uuid(self.customer_id),
            assigned_agent: self.assigned_agent_id.map(UserId::from_uuid),
            status: TicketStatus::from_str(&self.status).map_err(|err| err.to_string())?,
            priority: TicketPriority::from_str(&self.priority).map_err(|err| err.to_string())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            due_date: self.due_date,
            sla_breach_date: self.sla_breach_date,
            notes,
        })
        .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = ticket_notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NoteRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NoteRow {
    pub fn from_note(ticket: TicketId, note: &Note) -> Self {
        Self {
            id: note.id(),
            ticket_id: *ticket.as_uuid(),
            author_id: *note.author().as_uuid(),
            text: note.text().to_owned(),
            attachment: note.attachment().map(str::to_owned),
            created_at: note.created_at(),
        }
    }

    pub fn into_note(self) -> Result<Note, String> {
        Note::new(
            self.id,
            UserId::from_uuid(self.author_id),
            self.text,
            self.attachment,
            self.created_at,
        )
        .map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTicket, SlaPolicy, TicketTitle};
    use crate::test_support::{epoch, user_with_role};
    use rstest::rstest;

    #[rstest]
    fn ticket_rows_store_wire_spellings() {
        let customer = user_with_role("Casey Customer", Role::Customer);
        let mut ticket = Ticket::open(
            TicketId::random(),
            NewTicket {
                customer: customer.id().clone(),
                title: TicketTitle::new("Laptop fan noisy").expect("title"),
                description: String::new(),
                priority: TicketPriority::Critical,
            },
            epoch(),
            SlaPolicy::default().deadlines(Some(epoch())).expect("deadlines"),
        );
        ticket
            .transition_to(TicketStatus::InProgress, epoch())
            .expect("transition");

        let row = TicketRow::from_ticket(&ticket);
        assert_eq!(row.status, "in-progress");
        assert_eq!(row.priority, "critical");
        assert_eq!(row.assigned_agent_id, None);

        let restored = row.into_ticket(Vec::new()).expect("row converts back");
        assert_eq!(restored, ticket);
    }

    #[rstest]
    fn unknown_status_is_reported() {
        let row = TicketRow {
            id: Uuid::new_v4(),
            title: "Broken".to_owned(),
            description: String::new(),
            customer_id: Uuid::new_v4(),
            assigned_agent_id: None,
            status: "archived".to_owned(),
            priority: "low".to_owned(),
            created_at: epoch(),
            updated_at: epoch(),
            due_date: epoch(),
            sla_breach_date: epoch(),
        };
        assert!(row.into_ticket(Vec::new()).is_err());
    }

    #[rstest]
    fn user_rows_reject_unknown_roles() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            role: "superuser".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
        };
        assert!(row.into_user().is_err());
    }
}
