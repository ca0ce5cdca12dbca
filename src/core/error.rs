//! Error Module
//!
//! Defines the error taxonomy for the ORM layer. Engine-level failures
//! propagate unchanged to the immediate caller; nothing in this crate
//! retries. Statement interruption is folded into its own variant so
//! callers can tell a cancelled call from a failed one.
use thiserror::Error;

/// Error type covering every failure the ORM layer can surface:
/// - Engine errors from SQLite (syntax, constraint violations)
/// - Query construction errors (no target table bound)
/// - Gateway resolution errors (no database reachable)
/// - Statement cancellation
/// - Row-to-record mapping mismatches
#[derive(Error, Debug)]
pub enum OrmError {
    /// Errors surfaced by the underlying SQLite engine
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// SQL query errors (malformed statement, constraint violation)
    #[error("Query error: {0}")]
    Query(String),

    /// A terminal operation was invoked on a builder with no target table
    #[error("Unbound query: {0}")]
    UnboundQuery(String),

    /// No explicit gateway was given and no global default is installed
    #[error("No database available: {0}")]
    NoDatabase(String),

    /// The in-flight statement was interrupted via cancel
    #[error("Statement cancelled")]
    Cancelled,

    /// A result row did not match the shape the record expected
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Batch-insert records do not share the template's column set
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Type alias for Result using OrmError as the error type.
pub type Result<T> = std::result::Result<T, OrmError>;

impl OrmError {
    /// Wraps an engine error, converting an interrupt into `Cancelled`.
    ///
    /// SQLite reports a cancelled statement as `SQLITE_INTERRUPT`; every
    /// execution path goes through this so callers see `Cancelled` rather
    /// than a generic engine failure.
    pub(crate) fn from_engine(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::OperationInterrupted =>
            {
                OrmError::Cancelled
            }
            _ => OrmError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let db_err = OrmError::Database(rusqlite::Error::ExecuteReturnedResults);
        assert!(db_err.to_string().contains("Database error"));

        let query_err = OrmError::Query("syntax error".to_string());
        assert!(query_err.to_string().contains("Query error"));

        let mapping_err = OrmError::Mapping("missing column".to_string());
        assert!(mapping_err.to_string().contains("Mapping error"));
    }

    #[test]
    fn test_interrupt_becomes_cancelled() {
        let raw = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
            None,
        );
        match OrmError::from_engine(raw) {
            OrmError::Cancelled => {}
            other => panic!("Expected Cancelled, got {other:?}"),
        }
    }

    #[test]
    fn test_engine_error_conversion() {
        let raw = rusqlite::Error::ExecuteReturnedResults;
        let err: OrmError = raw.into();
        match err {
            OrmError::Database(_) => {}
            _ => panic!("Expected Database error"),
        }
    }
}
