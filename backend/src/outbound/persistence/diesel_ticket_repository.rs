//! PostgreSQL-backed `TicketRepository` implementation using Diesel ORM.
//!
//! Tickets and their notes live in separate tables. `update` only touches an
//! existing ticket row and inserts notes with `ON CONFLICT DO NOTHING` inside
//! one transaction, so concurrent note appends are never lost and a deleted
//! ticket stays deleted.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{TicketListFilter, TicketRepository, TicketRepositoryError};
use crate::domain::{
    ResolutionSample, Ticket, TicketId, TicketPriority, TicketStatus, UserId,
};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NoteRow, TicketRow};
use super::pool::{DbPool, PoolError};
use super::schema::{ticket_notes, tickets, users};

/// Diesel-backed ticket store.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TicketRepositoryError {
    map_basic_pool_error(error, |message| TicketRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> TicketRepositoryError {
    if is_foreign_key_violation(&error) {
        return TicketRepositoryError::query("ticket references an unknown user");
    }
    map_basic_diesel_error(
        error,
        |message| TicketRepositoryError::query(message),
        |message| TicketRepositoryError::connection(message),
    )
}

fn corrupt(message: String) -> TicketRepositoryError {
    TicketRepositoryError::query(format!("corrupt ticket row: {message}"))
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

async fn load_notes(
    conn: &mut AsyncPgConnection,
    ticket_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<NoteRow>>, diesel::result::Error> {
    if ticket_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<NoteRow> = ticket_notes::table
        .filter(ticket_notes::ticket_id.eq_any(ticket_ids))
        .select(NoteRow::as_select())
        .order_by((ticket_notes::created_at.asc(), ticket_notes::id.asc()))
        .load(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<NoteRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.ticket_id).or_default().push(row);
    }
    Ok(grouped)
}

fn note_rows(ticket: &Ticket) -> Vec<NoteRow> {
    ticket
        .notes()
        .iter()
        .map(|note| NoteRow::from_note(ticket.id(), note))
        .collect()
}

/// Notes are append-only, so rows another writer already stored are kept.
async fn insert_missing_notes(
    conn: &mut AsyncPgConnection,
    rows: &[NoteRow],
) -> Result<(), diesel::result::Error> {
    if rows.is_empty() {
        return Ok(());
    }
    diesel::insert_into(ticket_notes::table)
        .values(rows)
        .on_conflict(ticket_notes::id)
        .do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<TicketRow>,
) -> Result<Vec<Ticket>, TicketRepositoryError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut notes = load_notes(conn, &ids).await.map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| {
            let ticket_notes = notes.remove(&row.id).unwrap_or_default();
            row.into_ticket(ticket_notes).map_err(corrupt)
        })
        .collect()
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let row = TicketRow::from_ticket(ticket);
        let note_rows = note_rows(ticket);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(tickets::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                insert_missing_notes(conn, &note_rows).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update(&self, ticket: &Ticket) -> Result<bool, TicketRepositoryError> {
        let row = TicketRow::from_ticket(ticket);
        let note_rows = note_rows(ticket);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let matched = diesel::update(tickets::table.find(row.id))
                    .set(&row)
                    .execute(conn)
                    .await?;
                if matched == 0 {
                    return Ok(false);
                }
                insert_missing_notes(conn, &note_rows).await?;
                Ok::<_, diesel::result::Error>(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TicketRow> = tickets::table
            .find(id.as_uuid())
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(hydrate(&mut conn, vec![row]).await?.pop())
    }

    async fn list(&self, filter: &TicketListFilter) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = tickets::table
            .select(TicketRow::as_select())
            .order_by((tickets::updated_at.desc(), tickets::id.asc()))
            .into_boxed();
        if let Some(customer) = &filter.customer {
            query = query.filter(tickets::customer_id.eq(*customer.as_uuid()));
        }
        let rows: Vec<TicketRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn delete(&self, id: &TicketId) -> Result<bool, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(tickets::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn count_by_status(&self) -> Result<Vec<(TicketStatus, u64)>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, i64)> = tickets::table
            .group_by(tickets::status)
            .select((tickets::status, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(status, total)| {
                status
                    .parse::<TicketStatus>()
                    .map(|status| (status, count(total)))
                    .map_err(|err| corrupt(err.to_string()))
            })
            .collect()
    }

    async fn count_by_priority(
        &self,
    ) -> Result<Vec<(TicketPriority, u64)>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, i64)> = tickets::table
            .group_by(tickets::priority)
            .select((tickets::priority, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(priority, total)| {
                priority
                    .parse::<TicketPriority>()
                    .map(|priority| (priority, count(total)))
                    .map_err(|err| corrupt(err.to_string()))
            })
            .collect()
    }

    async fn closed_resolutions(&self) -> Result<Vec<ResolutionSample>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, String, DateTime<Utc>, DateTime<Utc>)> = tickets::table
            .inner_join(users::table.on(tickets::assigned_agent_id.eq(users::id.nullable())))
            .filter(tickets::status.eq(TicketStatus::Closed.as_str()))
            .select((
                users::id,
                users::name,
                tickets::created_at,
                tickets::updated_at,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(agent_id, agent_name, created_at, updated_at)| ResolutionSample {
                agent_id: UserId::from_uuid(agent_id),
                agent_name,
                created_at,
                updated_at,
            })
            .collect())
    }

    async fn overdue(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TicketRow> = tickets::table
            .filter(tickets::status.ne(TicketStatus::Closed.as_str()))
            .filter(tickets::sla_breach_date.lt(now))
            .select(TicketRow::as_select())
            .order_by((tickets::sla_breach_date.asc(), tickets::id.asc()))
            .limit(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }
}
