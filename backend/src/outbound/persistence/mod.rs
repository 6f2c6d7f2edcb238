//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories only translate between Diesel rows and domain types.
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay private
//! to this module. Connections come from a `bb8` pool over `diesel-async`.
//!
//! # Example
//!
//! ```no_run
//! use helpdesk::outbound::persistence::{DbPool, DieselTicketRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/helpdesk")).await?;
//! let tickets = DieselTicketRepository::new(pool);
//! # let _ = tickets;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_store_health;
mod diesel_ticket_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_ticket_repository::DieselTicketRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
