use crate::application::errors::StorageError;
use crate::domain::entities::UserId;
use async_trait::async_trait;

/// UserStore trait - durable set of user ids for broadcast targeting
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Add `id` if absent and persist. Returns whether an addition occurred;
    /// recording an already-known id is a no-op with no write.
    async fn record_if_new(&self, id: UserId) -> Result<bool, StorageError>;

    /// Remove `id` if present and persist. Returns whether a removal occurred.
    async fn remove(&self, id: UserId) -> Result<bool, StorageError>;

    /// Snapshot copy of the current set, safe to iterate while the live set
    /// keeps changing.
    async fn snapshot(&self) -> Vec<UserId>;

    async fn len(&self) -> usize;
}
