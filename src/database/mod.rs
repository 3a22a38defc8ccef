pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

use std::time::Duration;

use thiserror::Error;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::{PgStore, PgUnitOfWork};
pub use store::{
    CompanyStore, DepartmentStore, DesignationStore, EmployeeStore, EntityStore, RoleStore,
    TenantStore, TransactionalStore, UnitOfWork,
};

/// Failure of a single entity store operation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    #[error("Database error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Translate a driver error into a store error, keeping the operation name
/// in the message.
pub fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => StoreError::Conflict(msg),
                // foreign_key_violation
                Some("23503") => StoreError::InvalidReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{}: {}", operation, err))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Backend(format!("unexpected missing row in {}", operation))
        }
        other => StoreError::Backend(format!("{}: {}", operation, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_unavailable() {
        let err = map_sqlx_error("company_by_id", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(msg) if msg.starts_with("company_by_id")));
    }

    #[test]
    fn timeout_message_names_operation() {
        let err = StoreError::Timeout {
            operation: "create_company",
            limit: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "create_company timed out after 10s");
    }
}
