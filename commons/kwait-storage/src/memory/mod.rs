use crate::error::StorageError;
use crate::traits::*;
use async_trait::async_trait;
use kwait_models::Release;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type MemoryStore<T> = Arc<RwLock<HashMap<String, Vec<T>>>>;

#[derive(Clone, Default)]
pub struct MemoryReleaseStore {
    store: MemoryStore<Release>,
}

impl MemoryReleaseStore {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed the store with a set of releases.
    pub async fn with_releases(
        releases: impl IntoIterator<Item = Release>,
    ) -> Self {
        let s = Self::new();
        for r in releases {
            // store never fails for the memory backend
            let _ = s.store(&r).await;
        }
        s
    }
}

#[async_trait]
impl StorageHealth for MemoryReleaseStore {
    async fn health(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ReleaseStore for MemoryReleaseStore {
    async fn last(&self, name: &str) -> StorageResult<Release> {
        let store = self.store.read().await;
        store
            .get(name)
            .and_then(|versions| versions.iter().max_by_key(|r| r.version))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn history(&self, name: &str) -> StorageResult<Vec<Release>> {
        let store = self.store.read().await;
        let mut versions = store.get(name).cloned().unwrap_or_default();
        versions.sort_by_key(|r| r.version);
        Ok(versions)
    }

    async fn store(&self, release: &Release) -> StorageResult<()> {
        let mut store = self.store.write().await;
        let versions = store.entry(release.name.clone()).or_default();
        versions.retain(|r| r.version != release.version);
        versions.push(release.clone());
        Ok(())
    }
}
