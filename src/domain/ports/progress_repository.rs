//! Progress record store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ProgressRecord;

/// Repository interface for progress record persistence.
///
/// Implementations do no locking of their own: the engine serializes every
/// load/save pair for a given user.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load a user's record, `None` when the user has none yet.
    async fn load(&self, user_id: &str) -> DomainResult<Option<ProgressRecord>>;

    /// Insert or overwrite the record for `record.user_id`.
    async fn save(&self, record: &ProgressRecord) -> DomainResult<()>;

    /// Delete a user's record. Returns whether one existed.
    async fn delete(&self, user_id: &str) -> DomainResult<bool>;

    /// Ids of every user with a stored record.
    async fn list_user_ids(&self) -> DomainResult<Vec<String>>;
}
