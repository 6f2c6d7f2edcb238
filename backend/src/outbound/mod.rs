//! Outbound adapters implementing domain ports for infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM
//! - **memory**: in-process store used when no database is configured
//! - **security**: Argon2 password hashing and JWT bearer tokens
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod security;
