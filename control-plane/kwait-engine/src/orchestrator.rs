//! The orchestrator seam used by the waiter.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::cluster::{ClusterApi, FetchError};
use crate::manifest::{ManifestError, parse_manifest};
use crate::poller::{
    DEFAULT_POLL_INTERVAL, PollOptions, ReadinessError, wait_for_resources,
};
use crate::readiness::PredicateTable;
use crate::resource::{ResourceInfo, ResourceSet};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("kubernetes cluster unreachable: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("unable to recognize {kind}: {message}")]
    Discovery { kind: String, message: String },
    #[error(transparent)]
    Readiness(#[from] ReadinessError),
}

/// Everything the waiter needs from a cluster.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn is_reachable(&self) -> Result<(), OrchestratorError>;

    /// Materialize manifest text into resolved resources. Namespaced
    /// objects without a namespace land in `default_namespace`, or the
    /// cluster default when `None`.
    async fn build(
        &self,
        manifest: &str,
        default_namespace: Option<&str>,
    ) -> Result<ResourceSet, OrchestratorError>;

    /// Wait until all resources are ready; Jobs only need to exist.
    async fn wait(
        &self,
        resources: &ResourceSet,
        timeout: Duration,
    ) -> Result<(), OrchestratorError>;

    /// Like [`Orchestrator::wait`], but Jobs must run to completion.
    async fn wait_with_jobs(
        &self,
        resources: &ResourceSet,
        timeout: Duration,
    ) -> Result<(), OrchestratorError>;
}

/// [`Orchestrator`] on top of any [`ClusterApi`].
pub struct KubeOrchestrator<C> {
    cluster: C,
    poll_interval: Duration,
}

impl<C: ClusterApi> KubeOrchestrator<C> {
    pub fn new(cluster: C) -> Self {
        Self {
            cluster,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn poll(
        &self,
        resources: &ResourceSet,
        timeout: Duration,
        wait_for_jobs: bool,
    ) -> Result<(), OrchestratorError> {
        let table = PredicateTable::builtin(wait_for_jobs);
        let opts = PollOptions::new(timeout, self.poll_interval);
        wait_for_resources(&self.cluster, resources, &table, opts).await?;
        Ok(())
    }
}

#[async_trait]
impl<C: ClusterApi> Orchestrator for KubeOrchestrator<C> {
    async fn is_reachable(&self) -> Result<(), OrchestratorError> {
        let version = self.cluster.server_version().await.map_err(|e| {
            OrchestratorError::Unreachable(match e {
                FetchError::NotFound => "version endpoint not found".into(),
                FetchError::Transient(m) | FetchError::Fatal(m) => m,
            })
        })?;
        debug!(%version, "cluster reachable");
        Ok(())
    }

    #[instrument(level = "debug", skip(self, manifest))]
    async fn build(
        &self,
        manifest: &str,
        default_namespace: Option<&str>,
    ) -> Result<ResourceSet, OrchestratorError> {
        let objects = parse_manifest(manifest)?;
        let namespace = default_namespace
            .unwrap_or_else(|| self.cluster.default_namespace())
            .to_string();
        let mut set = ResourceSet::new();
        for object in objects {
            let resolved =
                self.cluster.resolve_kind(&object.gvk).await.map_err(|e| {
                    OrchestratorError::Discovery {
                        kind: format!(
                            "\"{}\" in version \"{}\"",
                            object.gvk.kind,
                            api_version(&object.gvk.group, &object.gvk.version)
                        ),
                        message: e.to_string(),
                    }
                })?;
            set.push(ResourceInfo::new(object, resolved, &namespace));
        }
        debug!(resources = set.len(), "manifest built");
        Ok(set)
    }

    async fn wait(
        &self,
        resources: &ResourceSet,
        timeout: Duration,
    ) -> Result<(), OrchestratorError> {
        self.poll(resources, timeout, false).await
    }

    async fn wait_with_jobs(
        &self,
        resources: &ResourceSet,
        timeout: Duration,
    ) -> Result<(), OrchestratorError> {
        self.poll(resources, timeout, true).await
    }
}

fn api_version(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{group}/{version}")
    }
}
