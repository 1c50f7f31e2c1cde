use crate::error::StorageError;
use async_trait::async_trait;
use kwait_models::Release;

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait StorageHealth: Send + Sync {
    /// Lightweight connectivity check to the backing store.
    async fn health(&self) -> StorageResult<()>;
}

/// Versioned release records keyed by release name.
#[async_trait]
pub trait ReleaseStore: Send + Sync + StorageHealth {
    /// Highest-versioned record for `name`, or `StorageError::NotFound`.
    async fn last(&self, name: &str) -> StorageResult<Release>;

    /// All stored versions of `name`, oldest first. Empty if unknown.
    async fn history(&self, name: &str) -> StorageResult<Vec<Release>>;

    /// Persist a release version. Replaces an existing record with the
    /// same name and version.
    async fn store(&self, release: &Release) -> StorageResult<()>;
}

/// Pick the record with the highest version.
pub fn latest(records: Vec<Release>) -> Option<Release> {
    records.into_iter().max_by_key(|r| r.version)
}
