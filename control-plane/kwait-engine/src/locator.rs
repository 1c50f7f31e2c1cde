use std::sync::Arc;

use kwait_models::{Release, validate_release_name};
use kwait_storage::{ReleaseStore, StorageError};
use tracing::{info, instrument};

use crate::error::WaitError;

/// Resolves a release name to its most recent stored record.
#[derive(Clone)]
pub struct ReleaseLocator {
    store: Arc<dyn ReleaseStore>,
}

impl ReleaseLocator {
    pub fn new(store: Arc<dyn ReleaseStore>) -> Self {
        Self { store }
    }

    /// The name is validated before storage is consulted.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, name: &str) -> Result<Release, WaitError> {
        validate_release_name(name).map_err(|source| {
            WaitError::InvalidReleaseName {
                name: name.to_string(),
                source,
            }
        })?;
        let release = self.store.last(name).await.map_err(|e| match e {
            StorageError::NotFound(_) => WaitError::ReleaseNotFound {
                name: name.to_string(),
            },
            source => WaitError::Storage {
                name: name.to_string(),
                source,
            },
        })?;
        info!("waiting for {} (current: v{})", release.name, release.version);
        Ok(release)
    }
}
