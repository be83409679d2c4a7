//! Error taxonomy for the directory core
//!
//! Every failure is scoped to the single request that produced it. `Storage`,
//! `OrphanPending` and `DeadlineExceeded` may be retried verbatim; the other
//! variants are terminal for the request.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for directory operations
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Malformed or missing required field
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced identity is absent or already retired
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Duplicate identity on creation (or a delete blocked by dependants)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Instance is archived but its live row has not been removed yet
    #[error("Instance '{instance_id}' is archived but still pending removal")]
    OrphanPending { instance_id: Uuid },

    /// Underlying persistence failure
    #[error("Storage failure while {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Caller deadline elapsed before the store acknowledged the operation
    #[error("Operation '{operation}' exceeded its {}ms deadline", .deadline.as_millis())]
    DeadlineExceeded {
        operation: &'static str,
        deadline: Duration,
    },
}

impl DirectoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DirectoryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the same request may be safely replayed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DirectoryError::Storage { .. }
                | DirectoryError::OrphanPending { .. }
                | DirectoryError::DeadlineExceeded { .. }
        )
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Attach an operation context to raw store errors.
pub trait StorageContext<T> {
    fn storage(self, context: impl Into<String>) -> DirectoryResult<T>;
}

impl<T> StorageContext<T> for Result<T, sqlx::Error> {
    fn storage(self, context: impl Into<String>) -> DirectoryResult<T> {
        self.map_err(|source| DirectoryError::Storage {
            context: context.into(),
            source,
        })
    }
}

/// Run `fut` under a caller-supplied deadline.
///
/// Dropping the inner future on expiry rolls back any open transaction, so an
/// elapsed deadline never leaves a partial write behind.
pub async fn with_deadline<T, F>(
    operation: &'static str,
    deadline: Duration,
    fut: F,
) -> DirectoryResult<T>
where
    F: std::future::Future<Output = DirectoryResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(DirectoryError::DeadlineExceeded {
            operation,
            deadline,
        }),
    }
}
