//! In-process store used when no database is configured.
//!
//! Implements both repository ports over maps guarded by a
//! `tokio::sync::RwLock`. It mirrors the PostgreSQL adapter's constraints:
//! unique emails, users cannot be deleted while tickets or notes reference
//! them, updates never recreate a deleted ticket, and an update never
//! drops notes another writer already stored.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{
    StoreHealth, StoreHealthError, TicketListFilter, TicketRepository, TicketRepositoryError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    EmailAddress, Note, PasswordHash, ResolutionSample, Ticket, TicketDraft, TicketId,
    TicketPriority, TicketStatus, User, UserAccount, UserId,
};

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, UserAccount>,
    tickets: HashMap<TicketId, Ticket>,
}

impl StoreState {
    fn email_taken(&self, email: &EmailAddress, except: Option<&UserId>) -> bool {
        self.users
            .values()
            .any(|account| account.user.email() == email && Some(account.user.id()) != except)
    }

    fn is_referenced(&self, id: &UserId) -> bool {
        self.tickets.values().any(|ticket| {
            ticket.customer() == id
                || ticket.assigned_agent() == Some(id)
                || ticket.notes().iter().any(|note| note.author() == id)
        })
    }

    fn references_known_users(&self, ticket: &Ticket) -> bool {
        let known = |id: &UserId| self.users.contains_key(id);
        known(ticket.customer())
            && ticket.assigned_agent().is_none_or(known)
            && ticket.notes().iter().all(|note| known(note.author()))
    }
}

/// Keep notes already stored under `existing` that `incoming` does not carry.
fn merge_notes(existing: &Ticket, incoming: &Ticket) -> Result<Ticket, TicketRepositoryError> {
    let mut notes: Vec<Note> = incoming.notes().to_vec();
    for note in existing.notes() {
        if !notes.iter().any(|candidate| candidate.id() == note.id()) {
            notes.push(note.clone());
        }
    }
    notes.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then(a.id().cmp(&b.id())));

    Ticket::from_draft(TicketDraft {
        id: incoming.id(),
        title: incoming.title().to_owned(),
        description: incoming.description().to_owned(),
        customer: incoming.customer().clone(),
        assigned_agent: incoming.assigned_agent().cloned(),
        status: incoming.status(),
        priority: incoming.priority(),
        created_at: incoming.created_at(),
        updated_at: incoming.updated_at(),
        due_date: incoming.due_date(),
        sla_breach_date: incoming.sla_breach_date(),
        notes,
    })
    .map_err(|err| TicketRepositoryError::query(err.to_string()))
}

/// Shared in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn check(&self) -> Result<(), StoreHealthError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut state = self.state.write().await;
        if state.email_taken(account.user.email(), None) {
            return Err(UserPersistenceError::duplicate_email(
                account.user.email().as_ref(),
            ));
        }
        state
            .users
            .insert(account.user.id().clone(), account.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut state = self.state.write().await;
        if state.email_taken(user.email(), Some(user.id())) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        Ok(match state.users.get_mut(user.id()) {
            Some(account) => {
                account.user = user.clone();
                true
            }
            None => false,
        })
    }

    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.state.write().await;
        Ok(match state.users.get_mut(id) {
            Some(account) => {
                account.password_hash = hash.clone();
                true
            }
            None => false,
        })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(state.users.get(id).map(|account| account.user.clone()))
    }

    async fn find_account_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|account| account.user.email() == email)
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .map(|account| account.user.clone())
            .collect())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .map(|account| account.user.clone())
            .collect();
        users.sort_by(|a, b| {
            a.name()
                .as_ref()
                .cmp(b.name().as_ref())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(users)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(id) {
            return Ok(false);
        }
        if state.is_referenced(id) {
            return Err(UserPersistenceError::still_referenced());
        }
        state.users.remove(id);
        Ok(true)
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut state = self.state.write().await;
        if !state.references_known_users(ticket) {
            return Err(TicketRepositoryError::query(
                "ticket references an unknown user",
            ));
        }
        if state.tickets.contains_key(&ticket.id()) {
            return Err(TicketRepositoryError::query(format!(
                "ticket {} already exists",
                ticket.id()
            )));
        }
        state.tickets.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> Result<bool, TicketRepositoryError> {
        let mut state = self.state.write().await;
        if !state.references_known_users(ticket) {
            return Err(TicketRepositoryError::query(
                "ticket references an unknown user",
            ));
        }
        let Some(existing) = state.tickets.get(&ticket.id()) else {
            return Ok(false);
        };
        let merged = merge_notes(existing, ticket)?;
        state.tickets.insert(ticket.id(), merged);
        Ok(true)
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let state = self.state.read().await;
        Ok(state.tickets.get(id).cloned())
    }

    async fn list(&self, filter: &TicketListFilter) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let state = self.state.read().await;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|ticket| {
                filter
                    .customer
                    .as_ref()
                    .is_none_or(|customer| ticket.customer() == customer)
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| {
            b.updated_at()
                .cmp(&a.updated_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(tickets)
    }

    async fn delete(&self, id: &TicketId) -> Result<bool, TicketRepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.tickets.remove(id).is_some())
    }

    async fn count_by_status(&self) -> Result<Vec<(TicketStatus, u64)>, TicketRepositoryError> {
        let state = self.state.read().await;
        let mut counts: HashMap<TicketStatus, u64> = HashMap::new();
        for ticket in state.tickets.values() {
            *counts.entry(ticket.status()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_by_priority(
        &self,
    ) -> Result<Vec<(TicketPriority, u64)>, TicketRepositoryError> {
        let state = self.state.read().await;
        let mut counts: HashMap<TicketPriority, u64> = HashMap::new();
        for ticket in state.tickets.values() {
            *counts.entry(ticket.priority()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn closed_resolutions(&self) -> Result<Vec<ResolutionSample>, TicketRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .tickets
            .values()
            .filter(|ticket| ticket.status() == TicketStatus::Closed)
            .filter_map(|ticket| {
                let agent = state.users.get(ticket.assigned_agent()?)?;
                Some(ResolutionSample {
                    agent_id: agent.user.id().clone(),
                    agent_name: agent.user.name().to_string(),
                    created_at: ticket.created_at(),
                    updated_at: ticket.updated_at(),
                })
            })
            .collect())
    }

    async fn overdue(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let state = self.state.read().await;
        let mut overdue: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|ticket| ticket.has_missed_sla(now))
            .cloned()
            .collect();
        overdue.sort_by(|a, b| {
            a.sla_breach_date()
                .cmp(&b.sla_breach_date())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        overdue.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(overdue)
    }
}
