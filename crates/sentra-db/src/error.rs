//! # Database Error Types
//!
//! Error types for persistence operations and state-conflict rejections.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Validation errors   - rejected before any write                │
//! │                        (empty reason, missing ids)              │
//! │  State conflicts     - rejected with no side effects            │
//! │                        (AlreadyReversed, ReviewNotPending,      │
//! │                         StaleState, NotAnApprover)              │
//! │  Persistence errors  - transient I/O surfaced unmasked          │
//! │                        (QueryFailed, ConnectionFailed, ...)     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Named business-rule rejections are distinct variants so callers can
//! tell "not allowed" from "could not complete". Nothing is recovered
//! silently.

use thiserror::Error;

/// Database and engine operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The movement was already reversed; a reversed movement is terminal.
    /// Rejected with no writes.
    #[error("Movement {id} is already reversed")]
    AlreadyReversed { id: String },

    /// A credit decision was attempted on a sale whose review is no longer
    /// pending. The caller should refresh state rather than retry blindly.
    #[error("Sale {sale_id} has no pending credit review")]
    ReviewNotPending { sale_id: String },

    /// A conditional write observed state that changed underneath it and
    /// retries were exhausted.
    #[error("{entity} {id} changed concurrently, operation not applied")]
    StaleState { entity: String, id: String },

    /// The acting identity is not in the tenant's approver set.
    #[error("User {user_id} is not authorized to approve for this tenant")]
    NotAnApprover { user_id: String },

    /// Input validation failure from the core rules.
    #[error(transparent)]
    Validation(#[from] sentra_core::ValidationError),

    /// Business rule violation from the core rules.
    #[error(transparent)]
    Core(#[from] sentra_core::CoreError),

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a StaleState error for a given entity type and ID.
    pub fn stale(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::StaleState {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this error is a named business-rule rejection (as opposed
    /// to a persistence failure). Rejections have no side effects and are
    /// not worth retrying without a state refresh.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DbError::AlreadyReversed { .. }
                | DbError::ReviewNotPending { .. }
                | DbError::StaleState { .. }
                | DbError::NotAnApprover { .. }
                | DbError::Validation(_)
                | DbError::Core(_)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// SQLite reports constraint failures in the error message:
/// `UNIQUE constraint failed: <table>.<column>` and
/// `FOREIGN KEY constraint failed`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_classified() {
        assert!(DbError::AlreadyReversed { id: "m1".into() }.is_rejection());
        assert!(DbError::ReviewNotPending { sale_id: "s1".into() }.is_rejection());
        assert!(DbError::stale("Sale", "s1").is_rejection());

        assert!(!DbError::QueryFailed("disk I/O error".into()).is_rejection());
        assert!(!DbError::PoolExhausted.is_rejection());
    }

    #[test]
    fn test_error_messages() {
        let err = DbError::AlreadyReversed { id: "m-7".into() };
        assert_eq!(err.to_string(), "Movement m-7 is already reversed");

        let err = DbError::not_found("Sale", "s-1");
        assert_eq!(err.to_string(), "Sale not found: s-1");
    }
}
