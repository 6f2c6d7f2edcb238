//! Shared Diesel error mapping for the helpdesk repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

fn log_diesel_error(error: &DieselError) {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            "diesel operation failed"
        ),
    }
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Callers that care about constraint violations match those first and fall
/// back to this helper for everything else.
pub fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    log_diesel_error(&error);

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// True when `error` is a foreign key violation.
pub fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

/// True when `error` is a unique constraint violation.
pub fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(&'static str),
        Connection(&'static str),
    }

    fn map(error: DieselError) -> Mapped {
        map_basic_diesel_error(error, Mapped::Query, Mapped::Connection)
    }

    #[rstest]
    fn not_found_is_a_query_error() {
        assert_eq!(map(DieselError::NotFound), Mapped::Query("record not found"));
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert_eq!(map(error), Mapped::Connection("database connection error"));
    }

    #[rstest]
    fn constraint_predicates_match_kinds() {
        let unique = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        let foreign = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("still referenced".to_owned()),
        );
        assert!(is_unique_violation(&unique));
        assert!(!is_foreign_key_violation(&unique));
        assert!(is_foreign_key_violation(&foreign));
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let mapped: String = map_basic_pool_error(PoolError::checkout("timed out"), |message| {
            format!("connection: {message}")
        });
        assert_eq!(mapped, "connection: timed out");
    }
}
