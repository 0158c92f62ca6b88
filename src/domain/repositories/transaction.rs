//! Unit-of-work contract for mutating repository calls.

use async_trait::async_trait;

use crate::error::AppError;

/// A database transaction scoped to one request.
///
/// Implementations must roll back when dropped without [`Transaction::commit`],
/// so every early return or `?` exit leaves no partial writes behind.
/// `sqlx::Transaction` has this property natively; the in-memory repository
/// discards its staged snapshot.
#[async_trait]
pub trait Transaction: Send {
    /// Makes all staged changes visible.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the backend rejects the commit.
    async fn commit(self) -> Result<(), AppError>;

    /// Discards all staged changes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the backend fails to roll back.
    async fn rollback(self) -> Result<(), AppError>;
}
