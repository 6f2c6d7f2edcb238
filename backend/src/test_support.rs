//! Test utilities shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and behind the `test-support` feature.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    AuthenticatedUser, DisplayName, EmailAddress, NewTicket, Role, SlaPolicy, Ticket, TicketId,
    TicketPriority, TicketTitle, User, UserId,
};

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock frozen at 2024-01-01T09:00:00Z.
    pub fn at_epoch() -> Self {
        Self::new(epoch())
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed reference instant used across test suites.
pub fn epoch() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single() {
        Some(value) => value,
        None => panic!("reference timestamp is unambiguous"),
    }
}

/// Build a user with a random id and an email derived from `name`.
pub fn user_with_role(name: &str, role: Role) -> User {
    let local = name.to_lowercase().replace(' ', ".");
    let (Ok(display_name), Ok(email)) = (
        DisplayName::new(name),
        EmailAddress::new(format!("{local}@example.com")),
    ) else {
        panic!("test user fields must be valid: {name}");
    };
    User::new(UserId::random(), display_name, email, role)
}

/// Authenticated caller with the given role.
pub fn caller(name: &str, role: Role) -> AuthenticatedUser {
    AuthenticatedUser::new(user_with_role(name, role))
}

/// Open ticket owned by `customer` with the standard SLA windows.
pub fn open_ticket(customer: &UserId, title: &str, created_at: DateTime<Utc>) -> Ticket {
    let (Ok(title), Ok(deadlines)) = (
        TicketTitle::new(title),
        SlaPolicy::default().deadlines(Some(created_at)),
    ) else {
        panic!("test ticket fields must be valid: {title}");
    };
    Ticket::open(
        TicketId::random(),
        NewTicket {
            customer: customer.clone(),
            title,
            description: String::new(),
            priority: TicketPriority::Medium,
        },
        created_at,
        deadlines,
    )
}
