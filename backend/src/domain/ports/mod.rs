//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, store health, hashing, tokens) expose typed errors built
//! with `define_port_error!`. Driving ports return the domain [`Error`]
//! so inbound adapters can map failures uniformly.
//!
//! [`Error`]: crate::domain::Error

mod macros;
pub(crate) use macros::define_port_error;

mod access_gate;
mod accounts;
mod credentials;
mod dashboard_query;
mod store_health;
mod ticket_command;
mod ticket_repository;
mod user_repository;

pub use access_gate::AccessGate;
#[cfg(test)]
pub use accounts::{MockAccountCommand, MockUserAdministration};
pub use accounts::{
    AccountCommand, AuthSession, CreateUserRequest, ProfileUpdate, RegisterRequest,
    UserAdministration, UserUpdate,
};
#[cfg(test)]
pub use credentials::{MockAccessTokenService, MockPasswordHasher};
pub use credentials::{AccessTokenService, PasswordHashError, PasswordHasher, TokenError};
#[cfg(test)]
pub use dashboard_query::{MockDashboardQuery, MockTicketAggregates};
pub use dashboard_query::{DashboardQuery, DashboardSnapshot, TicketAggregates};
#[cfg(test)]
pub use store_health::MockStoreHealth;
pub use store_health::{StoreHealth, StoreHealthError};
#[cfg(test)]
pub use ticket_command::{MockTicketCommand, MockTicketQuery};
pub use ticket_command::{
    AddNoteRequest, CreateTicketRequest, TicketCommand, TicketDetails, TicketQuery,
    UpdateTicketRequest,
};
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{TicketListFilter, TicketRepository, TicketRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
