#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("release not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt release record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[cfg(feature = "secret")]
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
