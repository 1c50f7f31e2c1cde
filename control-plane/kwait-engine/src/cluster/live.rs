use std::collections::HashMap;

use async_trait::async_trait;
use kube::api::Api;
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::{self, Scope};
use kube::Client;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

use super::{ClusterApi, FetchError, ResolvedKind};
use crate::resource::ResourceInfo;

/// [`ClusterApi`] backed by a real `kube::Client`.
///
/// Kind discovery results are memoized for the lifetime of the value so
/// a manifest with many objects of the same kind costs one lookup.
pub struct LiveCluster {
    client: Client,
    kinds: RwLock<HashMap<String, ResolvedKind>>,
}

impl LiveCluster {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            kinds: RwLock::new(HashMap::new()),
        }
    }
}

fn gvk_key(gvk: &GroupVersionKind) -> String {
    format!("{}/{}/{}", gvk.group, gvk.version, gvk.kind)
}

#[async_trait]
impl ClusterApi for LiveCluster {
    async fn server_version(&self) -> Result<String, FetchError> {
        let info = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| FetchError::Fatal(e.to_string()))?;
        Ok(info.git_version)
    }

    #[instrument(level = "debug", skip(self), fields(kind = %gvk.kind))]
    async fn resolve_kind(
        &self,
        gvk: &GroupVersionKind,
    ) -> Result<ResolvedKind, FetchError> {
        let key = gvk_key(gvk);
        if let Some(hit) = self.kinds.read().await.get(&key) {
            trace!(%key, "resolve_kind: cache hit");
            return Ok(hit.clone());
        }
        let (api_resource, caps) = discovery::pinned_kind(&self.client, gvk)
            .await
            .map_err(|e| match FetchError::from_kube(e) {
                FetchError::NotFound => FetchError::Fatal(format!(
                    "no resource '{}' registered in group version '{}'",
                    gvk.kind,
                    if gvk.group.is_empty() {
                        gvk.version.clone()
                    } else {
                        format!("{}/{}", gvk.group, gvk.version)
                    }
                )),
                other => other,
            })?;
        let resolved = ResolvedKind {
            api_resource,
            namespaced: matches!(caps.scope, Scope::Namespaced),
        };
        debug!(
            %key,
            namespaced = resolved.namespaced,
            "resolve_kind: discovered"
        );
        self.kinds.write().await.insert(key, resolved.clone());
        Ok(resolved)
    }

    async fn get(
        &self,
        resource: &ResourceInfo,
    ) -> Result<DynamicObject, FetchError> {
        let api: Api<DynamicObject> = match resource.namespace.as_deref() {
            Some(ns) => Api::namespaced_with(
                self.client.clone(),
                ns,
                &resource.api_resource,
            ),
            None => Api::all_with(self.client.clone(), &resource.api_resource),
        };
        api.get(&resource.name).await.map_err(FetchError::from_kube)
    }

    fn default_namespace(&self) -> &str {
        self.client.default_namespace()
    }
}
