pub mod live;

pub use live::LiveCluster;

use async_trait::async_trait;
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;

use crate::resource::ResourceInfo;

/// API resource of a kind together with its scope.
#[derive(Clone, Debug)]
pub struct ResolvedKind {
    pub api_resource: ApiResource,
    pub namespaced: bool,
}

impl ResolvedKind {
    pub fn namespaced(gvk: &GroupVersionKind) -> Self {
        Self {
            api_resource: ApiResource::from_gvk(gvk),
            namespaced: true,
        }
    }

    pub fn cluster_scoped(gvk: &GroupVersionKind) -> Self {
        Self {
            api_resource: ApiResource::from_gvk(gvk),
            namespaced: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("not found")]
    NotFound,
    /// Throttling, server-side or transport failures worth retrying.
    #[error("transient error: {0}")]
    Transient(String),
    #[error("{0}")]
    Fatal(String),
}

impl FetchError {
    pub fn from_kube(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => match resp.code {
                404 => FetchError::NotFound,
                429 | 500..=599 => FetchError::Transient(resp.message.clone()),
                _ => FetchError::Fatal(format!(
                    "{} ({})",
                    resp.message, resp.code
                )),
            },
            other => FetchError::Transient(other.to_string()),
        }
    }
}

/// The read-only slice of the Kubernetes API the waiter relies on.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Server version string; used as the reachability check.
    async fn server_version(&self) -> Result<String, FetchError>;

    /// Resolve the API resource and scope for a kind.
    async fn resolve_kind(
        &self,
        gvk: &GroupVersionKind,
    ) -> Result<ResolvedKind, FetchError>;

    /// Fetch the live state of one resource.
    async fn get(&self, resource: &ResourceInfo)
    -> Result<DynamicObject, FetchError>;

    /// Namespace used for namespaced objects that do not declare one.
    fn default_namespace(&self) -> &str;
}

#[async_trait]
impl<T: ClusterApi + ?Sized> ClusterApi for std::sync::Arc<T> {
    async fn server_version(&self) -> Result<String, FetchError> {
        (**self).server_version().await
    }

    async fn resolve_kind(
        &self,
        gvk: &GroupVersionKind,
    ) -> Result<ResolvedKind, FetchError> {
        (**self).resolve_kind(gvk).await
    }

    async fn get(&self, resource: &ResourceInfo)
    -> Result<DynamicObject, FetchError> {
        (**self).get(resource).await
    }

    fn default_namespace(&self) -> &str {
        (**self).default_namespace()
    }
}
