use crate::types::Operation;
use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        /// Column(s) named by SQLite, e.g. `email` or `room_number`
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation { message: String },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation { constraint: Option<String>, message: String },

    /// A referenced entity, looked up by a natural key, does not exist
    #[error("{entity_type} '{reference}' does not exist")]
    MissingReference { entity_type: String, reference: String },

    /// A room has no free bed left
    #[error("Room {room_number} is at capacity")]
    CapacityExceeded { room_number: String },

    /// Entity cannot be modified or deleted due to protection rules
    #[error("{operation:?} cannot be applied to entity of type {entity_type}: {reason}")]
    ProtectedEntity {
        operation: Operation,
        reason: String,
        entity_type: String,
        entity_id: Option<String>,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let (table, constraint) = parse_constraint_target(db_err.message(), "UNIQUE constraint failed:").unzip();
                    DbError::UniqueViolation {
                        constraint,
                        table,
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err
                            .message()
                            .strip_prefix("CHECK constraint failed:")
                            .map(|s| s.trim().to_string()),
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract `(table, columns)` from an SQLite constraint message.
///
/// SQLite does not report constraint names, only the offending columns:
/// "UNIQUE constraint failed: students.email" -> ("students", "email").
/// Composite keys list every column: "UNIQUE constraint failed: t.a, t.b" -> ("t", "a,b").
fn parse_constraint_target(message: &str, prefix: &str) -> Option<(String, String)> {
    let targets = message.strip_prefix(prefix)?.trim();
    let mut table = None;
    let mut columns = Vec::new();

    for target in targets.split(',') {
        let (t, column) = target.trim().split_once('.')?;
        table.get_or_insert_with(|| t.to_string());
        columns.push(column.to_string());
    }

    Some((table?, columns.join(",")))
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unique_message() {
        assert_eq!(
            parse_constraint_target("UNIQUE constraint failed: students.email", "UNIQUE constraint failed:"),
            Some(("students".to_string(), "email".to_string()))
        );
        assert_eq!(
            parse_constraint_target("UNIQUE constraint failed: rooms.room_number", "UNIQUE constraint failed:"),
            Some(("rooms".to_string(), "room_number".to_string()))
        );
    }

    #[test]
    fn test_parse_composite_unique_message() {
        assert_eq!(
            parse_constraint_target("UNIQUE constraint failed: a.x, a.y", "UNIQUE constraint failed:"),
            Some(("a".to_string(), "x,y".to_string()))
        );
    }

    #[test]
    fn test_parse_unexpected_message() {
        assert_eq!(parse_constraint_target("database is locked", "UNIQUE constraint failed:"), None);
        assert_eq!(parse_constraint_target("UNIQUE constraint failed: nodot", "UNIQUE constraint failed:"), None);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }
}
