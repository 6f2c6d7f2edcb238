//! Ticket lifecycle service.
//!
//! Implements the ticket command and query driving ports: opening tickets
//! with SLA deadlines, status transitions, assignment, notes and deletion.
//! Role checks happen at the inbound boundary; this service enforces the
//! participant rule (customers only touch their own tickets).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::ports::{
    AddNoteRequest, CreateTicketRequest, TicketCommand, TicketDetails, TicketListFilter,
    TicketQuery, TicketRepository, TicketRepositoryError, UpdateTicketRequest,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    AuthenticatedUser, Error, NewTicket, Note, Role, SlaPolicy, Ticket, TicketId, TicketStatus,
    TicketTitle, UserId, authorize,
};

fn map_ticket_error(error: TicketRepositoryError) -> Error {
    error!(%error, "ticket repository failure");
    Error::internal(format!("ticket storage failed: {error}"))
}

fn map_user_error(error: UserPersistenceError) -> Error {
    error!(%error, "user repository failure");
    Error::internal(format!("user storage failed: {error}"))
}

fn ensure_participant(actor: &AuthenticatedUser, ticket: &Ticket) -> Result<(), Error> {
    if actor.role() == Role::Customer && ticket.customer() != actor.id() {
        return Err(Error::forbidden("only the ticket owner or staff may access this ticket"));
    }
    Ok(())
}

fn referenced_users<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    for ticket in tickets {
        seen.insert(ticket.customer().clone());
        if let Some(agent) = ticket.assigned_agent() {
            seen.insert(agent.clone());
        }
        for note in ticket.notes() {
            seen.insert(note.author().clone());
        }
    }
    seen.into_iter().collect()
}

/// Ticket lifecycle service generic over its repositories.
#[derive(Clone)]
pub struct TicketLifecycleService<T, U> {
    tickets: Arc<T>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    sla: SlaPolicy,
}

impl<T, U> TicketLifecycleService<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    /// Create the service.
    pub fn new(tickets: Arc<T>, users: Arc<U>, clock: Arc<dyn Clock>, sla: SlaPolicy) -> Self {
        Self {
            tickets,
            users,
            clock,
            sla,
        }
    }

    async fn load(&self, id: TicketId) -> Result<Ticket, Error> {
        self.tickets
            .find_by_id(&id)
            .await
            .map_err(map_ticket_error)?
            .ok_or_else(|| Error::not_found(format!("ticket {id} not found")))
    }

    async fn load_for(&self, actor: &AuthenticatedUser, id: TicketId) -> Result<Ticket, Error> {
        let ticket = self.load(id).await?;
        ensure_participant(actor, &ticket)?;
        Ok(ticket)
    }

    async fn names_for(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>, Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self.users.find_many(ids).await.map_err(map_user_error)?;
        Ok(users
            .into_iter()
            .map(|user| (user.id().clone(), user.name().to_string()))
            .collect())
    }

    async fn with_names(&self, ticket: Ticket) -> Result<TicketDetails, Error> {
        let names = self.names_for(&referenced_users([&ticket])).await?;
        Ok(TicketDetails { ticket, names })
    }

    /// Persist changes to a loaded ticket. A concurrent delete wins: the
    /// ticket is reported missing rather than written back.
    async fn store(&self, ticket: &Ticket) -> Result<(), Error> {
        let updated = self.tickets.update(ticket).await.map_err(map_ticket_error)?;
        if !updated {
            return Err(Error::not_found(format!("ticket {} not found", ticket.id())));
        }
        Ok(())
    }

    async fn ensure_assignable(&self, agent: &UserId) -> Result<(), Error> {
        let assignee = self
            .users
            .find_by_id(agent)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| {
                Error::invalid_request(format!("assignee {agent} does not exist"))
                    .with_details(json!({ "field": "assignedAgent", "code": "unknown_user" }))
            })?;
        if !assignee.role().is_staff() {
            return Err(
                Error::invalid_request("assignee must be an agent or admin")
                    .with_details(json!({ "field": "assignedAgent", "code": "not_staff" })),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<T, U> TicketCommand for TicketLifecycleService<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    async fn create_ticket(
        &self,
        actor: &AuthenticatedUser,
        request: CreateTicketRequest,
    ) -> Result<TicketDetails, Error> {
        let title = TicketTitle::new(&request.title)?;
        let created_at = self.clock.utc();
        let deadlines = self.sla.deadlines(Some(created_at))?;
        let ticket = Ticket::open(
            TicketId::random(),
            NewTicket {
                customer: actor.id().clone(),
                title,
                description: request.description.unwrap_or_default(),
                priority: request.priority.unwrap_or_default(),
            },
            created_at,
            deadlines,
        );

        self.tickets
            .insert(&ticket)
            .await
            .map_err(map_ticket_error)?;
        info!(
            ticket_id = %ticket.id(),
            customer = %actor.id(),
            priority = %ticket.priority(),
            sla_breach_date = %ticket.sla_breach_date(),
            "ticket created"
        );
        self.with_names(ticket).await
    }

    async fn update_status(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<TicketDetails, Error> {
        self.update_ticket(
            actor,
            id,
            UpdateTicketRequest {
                status: Some(status),
                ..UpdateTicketRequest::default()
            },
        )
        .await
    }

    async fn update_ticket(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
        request: UpdateTicketRequest,
    ) -> Result<TicketDetails, Error> {
        let UpdateTicketRequest {
            status,
            priority,
            assigned_agent,
        } = request;
        if status.is_none() && priority.is_none() && assigned_agent.is_none() {
            return Err(Error::invalid_request("no changes requested"));
        }

        let mut ticket = self.load_for(actor, id).await?;
        if priority.is_some() || assigned_agent.is_some() {
            authorize(actor, &[Role::Agent, Role::Admin])?;
        }
        if let Some(Some(agent)) = &assigned_agent {
            self.ensure_assignable(agent).await?;
        }

        let now = self.clock.utc();
        let previous = ticket.status();
        if let Some(next) = status {
            ticket.transition_to(next, now)?;
        }
        if let Some(priority) = priority {
            ticket.reprioritise(priority, now);
        }
        if let Some(agent) = assigned_agent {
            ticket.assign(agent, now);
        }

        self.store(&ticket).await?;
        info!(
            ticket_id = %id,
            actor = %actor.id(),
            from = %previous,
            to = %ticket.status(),
            "ticket updated"
        );
        self.with_names(ticket).await
    }

    async fn add_note(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
        request: AddNoteRequest,
    ) -> Result<TicketDetails, Error> {
        let mut ticket = self.load_for(actor, id).await?;
        let note = Note::new(
            Uuid::new_v4(),
            actor.id().clone(),
            &request.text,
            request.attachment,
            self.clock.utc(),
        )?;
        ticket.append_note(note)?;

        self.store(&ticket).await?;
        info!(ticket_id = %id, author = %actor.id(), notes = ticket.notes().len(), "note added");
        self.with_names(ticket).await
    }

    async fn delete_ticket(&self, actor: &AuthenticatedUser, id: TicketId) -> Result<(), Error> {
        let deleted = self.tickets.delete(&id).await.map_err(map_ticket_error)?;
        if !deleted {
            return Err(Error::not_found(format!("ticket {id} not found")));
        }
        info!(ticket_id = %id, actor = %actor.id(), "ticket deleted");
        Ok(())
    }
}

#[async_trait]
impl<T, U> TicketQuery for TicketLifecycleService<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    async fn get_ticket(
        &self,
        actor: &AuthenticatedUser,
        id: TicketId,
    ) -> Result<TicketDetails, Error> {
        let ticket = self.load_for(actor, id).await?;
        self.with_names(ticket).await
    }

    async fn list_tickets(&self, actor: &AuthenticatedUser) -> Result<Vec<TicketDetails>, Error> {
        let filter = TicketListFilter {
            customer: (actor.role() == Role::Customer).then(|| actor.id().clone()),
        };
        let tickets = self.tickets.list(&filter).await.map_err(map_ticket_error)?;
        let names = self.names_for(&referenced_users(&tickets)).await?;

        Ok(tickets
            .into_iter()
            .map(|ticket| TicketDetails {
                names: referenced_users([&ticket])
                    .into_iter()
                    .filter_map(|id| names.get(&id).map(|name| (id, name.clone())))
                    .collect(),
                ticket,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "ticket_lifecycle_tests.rs"]
mod tests;
