//! `DieselTicketRepository` against a real PostgreSQL database.
//!
//! Tests stay synchronous and drive the repository through a runtime held
//! by the context, so the embedded cluster bootstrap never runs inside an
//! async executor. Set `SKIP_TEST_CLUSTER=1` where PostgreSQL cannot start.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use diesel::QueryableByName;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use helpdesk::domain::ports::{
    StoreHealth, TicketAggregates, TicketRepository, TicketRepositoryError, UserRepository,
};
use helpdesk::domain::{
    MissedSlaLimit, Note, PasswordHash, Role, Ticket, TicketAggregationService, TicketId,
    TicketPriority, TicketStats, TicketStatus, User, UserAccount,
};
use helpdesk::outbound::persistence::{
    DbPool, DieselTicketRepository, DieselUserRepository, PoolConfig,
};
use helpdesk::test_support::{MutableClock, epoch, open_ticket, user_with_role};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use uuid::Uuid;

mod support;

use support::embedded_postgres::{provision_database, shared_cluster};
use support::handle_cluster_setup_failure;

#[derive(QueryableByName)]
struct NoteCount {
    #[diesel(sql_type = BigInt)]
    notes: i64,
}

struct Context {
    runtime: Runtime,
    pool: DbPool,
    tickets: DieselTicketRepository,
    users: DieselUserRepository,
    customer: User,
    agent: User,
    // Dropped last so the pool closes before the database goes away.
    _database: TemporaryDatabase,
}

impl Context {
    fn seed_user(&self, user: &User) {
        let account = UserAccount {
            user: user.clone(),
            password_hash: PasswordHash::new("$argon2id$stub"),
        };
        self.runtime
            .block_on(self.users.insert(&account))
            .expect("seed user");
    }

    fn insert(&self, ticket: &Ticket) {
        self.runtime
            .block_on(self.tickets.insert(ticket))
            .expect("insert ticket");
    }

    fn update(&self, ticket: &Ticket) -> bool {
        self.runtime
            .block_on(self.tickets.update(ticket))
            .expect("update ticket")
    }

    fn find(&self, id: &TicketId) -> Option<Ticket> {
        self.runtime
            .block_on(self.tickets.find_by_id(id))
            .expect("find ticket")
    }

    /// Ticket created at `created_at`, handled by `agent` and closed after
    /// `days`.
    fn closed_by(&self, agent: &User, created_at: DateTime<Utc>, days: i64) -> Ticket {
        let mut ticket = open_ticket(self.customer.id(), "resolved", created_at);
        self.insert(&ticket);
        ticket.assign(Some(agent.id().clone()), created_at);
        ticket
            .transition_to(TicketStatus::Closed, created_at + TimeDelta::days(days))
            .expect("open tickets may close");
        assert!(self.update(&ticket));
        ticket
    }
}

fn setup_context() -> Result<Context, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_database(cluster)?;

    let config = PoolConfig::new(database.url().to_string())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    let context = Context {
        runtime,
        tickets: DieselTicketRepository::new(pool.clone()),
        users: DieselUserRepository::new(pool.clone()),
        pool,
        customer: user_with_role("Carla Customer", Role::Customer),
        agent: user_with_role("Aidan Agent", Role::Agent),
        _database: database,
    };
    context.seed_user(&context.customer);
    context.seed_user(&context.agent);
    Ok(context)
}

#[fixture]
fn context() -> Option<Context> {
    match setup_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn inserted_ticket_reads_back_with_notes(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let mut ticket = open_ticket(ctx.customer.id(), "Printer on fire", epoch());
    ticket
        .append_note(
            Note::new(Uuid::new_v4(), ctx.customer.id().clone(), "smoke", None, epoch())
                .expect("valid note"),
        )
        .expect("note fits");
    ctx.insert(&ticket);

    let found = ctx.find(&ticket.id()).expect("ticket stored");
    assert_eq!(found.title(), "Printer on fire");
    assert_eq!(found.status(), TicketStatus::Open);
    assert_eq!(found.notes().len(), 1);
    assert_eq!(found.notes()[0].text(), "smoke");
}

#[rstest]
fn insert_for_unknown_customer_is_rejected(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let stranger = user_with_role("Nobody Known", Role::Customer);
    let ticket = open_ticket(stranger.id(), "orphan", epoch());

    let err = ctx
        .runtime
        .block_on(ctx.tickets.insert(&ticket))
        .expect_err("customer row is missing");
    assert!(matches!(err, TicketRepositoryError::Query { .. }), "{err}");
    assert!(ctx.find(&ticket.id()).is_none());
}

#[rstest]
fn delete_removes_the_notes_with_the_ticket(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let mut ticket = open_ticket(ctx.customer.id(), "Noisy fan", epoch());
    let note_id = Uuid::new_v4();
    ticket
        .append_note(
            Note::new(note_id, ctx.agent.id().clone(), "ordered a fan", None, epoch())
                .expect("valid note"),
        )
        .expect("note fits");
    ctx.insert(&ticket);

    assert!(ctx.runtime.block_on(ctx.tickets.delete(&ticket.id())).expect("delete"));
    assert!(ctx.find(&ticket.id()).is_none());

    // A stale copy must neither bring the ticket back nor leave notes behind.
    assert!(!ctx.update(&ticket));
    assert!(ctx.find(&ticket.id()).is_none());
    let orphaned = ctx.runtime.block_on(async {
        let mut conn = ctx.pool.get().await.expect("connection");
        diesel::sql_query("SELECT count(*) AS notes FROM ticket_notes WHERE id = $1")
            .bind::<diesel::sql_types::Uuid, _>(note_id)
            .get_result::<NoteCount>(&mut conn)
            .await
            .expect("count notes")
    });
    assert_eq!(orphaned.notes, 0);
    assert!(!ctx.runtime.block_on(ctx.tickets.delete(&ticket.id())).expect("delete"));
}

#[rstest]
fn concurrent_updates_keep_every_note(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let ticket = open_ticket(ctx.customer.id(), "Shared edit", epoch());
    ctx.insert(&ticket);

    let mut from_agent = ticket.clone();
    let mut from_customer = ticket.clone();
    from_agent
        .append_note(
            Note::new(Uuid::new_v4(), ctx.agent.id().clone(), "looking", None, epoch())
                .expect("valid note"),
        )
        .expect("note fits");
    from_customer
        .append_note(
            Note::new(Uuid::new_v4(), ctx.customer.id().clone(), "still broken", None, epoch())
                .expect("valid note"),
        )
        .expect("note fits");

    assert!(ctx.update(&from_agent));
    assert!(ctx.update(&from_customer));

    let stored = ctx.find(&ticket.id()).expect("ticket stored");
    let mut texts: Vec<_> = stored.notes().iter().map(Note::text).collect();
    texts.sort_unstable();
    assert_eq!(texts, ["looking", "still broken"]);
}

#[rstest]
fn counts_group_every_ticket(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let open = open_ticket(ctx.customer.id(), "one", epoch());
    let mut held = open_ticket(ctx.customer.id(), "two", epoch());
    let mut urgent = open_ticket(ctx.customer.id(), "three", epoch());
    for ticket in [&open, &held, &urgent] {
        ctx.insert(ticket);
    }
    held.transition_to(TicketStatus::OnHold, epoch())
        .expect("open tickets may pause");
    urgent.reprioritise(TicketPriority::High, epoch());
    assert!(ctx.update(&held));
    assert!(ctx.update(&urgent));

    let by_status = ctx
        .runtime
        .block_on(ctx.tickets.count_by_status())
        .expect("count by status");
    let by_priority = ctx
        .runtime
        .block_on(ctx.tickets.count_by_priority())
        .expect("count by priority");
    let stats = TicketStats::from_counts(&by_status, &by_priority);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_status.open, 2);
    assert_eq!(stats.by_status.on_hold, 1);
    assert_eq!(stats.by_status.closed, 0);
    assert_eq!(stats.by_priority.medium, 2);
    assert_eq!(stats.by_priority.high, 1);
}

#[rstest]
fn overdue_skips_closed_tickets_and_orders_by_breach(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let oldest = open_ticket(ctx.customer.id(), "oldest", epoch());
    let middle = open_ticket(ctx.customer.id(), "middle", epoch() + TimeDelta::hours(1));
    let newest = open_ticket(ctx.customer.id(), "newest", epoch() + TimeDelta::hours(2));
    for ticket in [&newest, &oldest, &middle] {
        ctx.insert(ticket);
    }
    ctx.closed_by(&ctx.agent, epoch() - TimeDelta::days(30), 1);

    let now = epoch() + TimeDelta::days(365);
    let all = ctx
        .runtime
        .block_on(ctx.tickets.overdue(now, 10))
        .expect("overdue");
    let ids: Vec<_> = all.iter().map(Ticket::id).collect();
    assert_eq!(ids, [oldest.id(), middle.id(), newest.id()]);
    assert!(all.iter().all(|ticket| ticket.status() != TicketStatus::Closed));
    assert!(
        all.windows(2)
            .all(|pair| pair[0].sla_breach_date() <= pair[1].sla_breach_date())
    );

    let limited = ctx
        .runtime
        .block_on(ctx.tickets.overdue(now, 2))
        .expect("overdue");
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id(), oldest.id());

    let before_any_breach = ctx
        .runtime
        .block_on(ctx.tickets.overdue(epoch(), 10))
        .expect("overdue");
    assert!(before_any_breach.is_empty());
}

#[rstest]
fn user_performance_averages_closed_tickets_per_agent(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let idle_agent = user_with_role("Ivy Idle", Role::Agent);
    ctx.seed_user(&idle_agent);

    ctx.closed_by(&ctx.agent, epoch(), 1);
    ctx.closed_by(&ctx.agent, epoch() + TimeDelta::hours(5), 3);
    let mut still_open = open_ticket(ctx.customer.id(), "pending", epoch());
    ctx.insert(&still_open);
    still_open.assign(Some(idle_agent.id().clone()), epoch());
    assert!(ctx.update(&still_open));

    let engine = TicketAggregationService::new(
        Arc::new(ctx.tickets.clone()),
        Arc::new(MutableClock::at_epoch()),
    );
    let performance = ctx
        .runtime
        .block_on(engine.user_performance())
        .expect("user performance");

    assert_eq!(performance.len(), 1, "agents without closed tickets are omitted");
    let row = &performance[0];
    assert_eq!(&row.agent_id, ctx.agent.id());
    assert_eq!(row.agent_name, "Aidan Agent");
    assert_eq!(row.tickets_resolved, 2);
    assert!((row.average_resolution_days - 2.0).abs() < 1e-9);
}

#[rstest]
fn missed_sla_slice_uses_the_clock(context: Option<Context>) {
    let Some(ctx) = context else { return };
    let ticket = open_ticket(ctx.customer.id(), "slow", epoch());
    ctx.insert(&ticket);
    let clock = Arc::new(MutableClock::at_epoch());
    let engine = TicketAggregationService::new(Arc::new(ctx.tickets.clone()), clock.clone());
    let limit = MissedSlaLimit::default();

    let early = ctx
        .runtime
        .block_on(engine.missed_sla_tickets(limit))
        .expect("missed sla");
    assert!(early.is_empty());

    clock.set(ticket.sla_breach_date() + TimeDelta::minutes(1));
    let late = ctx
        .runtime
        .block_on(engine.missed_sla_tickets(limit))
        .expect("missed sla");
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].id(), ticket.id());
}

#[rstest]
fn pool_reports_the_store_reachable(context: Option<Context>) {
    let Some(ctx) = context else { return };
    ctx.runtime
        .block_on(ctx.pool.check())
        .expect("store answers");
}
