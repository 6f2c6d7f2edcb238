//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Display name, at most 64 characters.
        name -> Varchar,
        /// Lowercased, unique.
        email -> Varchar,
        /// One of `customer`, `agent`, `admin`.
        role -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tickets (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        customer_id -> Uuid,
        assigned_agent_id -> Nullable<Uuid>,
        /// Kebab-case lifecycle state.
        status -> Varchar,
        priority -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        due_date -> Timestamptz,
        sla_breach_date -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only notes; removed with their ticket.
    ticket_notes (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        author_id -> Uuid,
        text -> Text,
        attachment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(ticket_notes -> tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(users, tickets, ticket_notes);
