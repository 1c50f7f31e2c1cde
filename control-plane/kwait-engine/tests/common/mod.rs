#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kube::core::{DynamicObject, GroupVersionKind};
use kwait_engine::cluster::{ClusterApi, FetchError, ResolvedKind};
use kwait_engine::{
    KubeOrchestrator, ReadinessWaiter, ReleaseLocator, ResourceInfo, Wait,
    WaitOptions,
};
use kwait_models::Release;
use kwait_storage::memory::MemoryReleaseStore;
use kwait_storage::{ReleaseStore, StorageHealth, StorageResult};
use serde_json::{Value, json};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Scripted stand-in for a Kubernetes API server.
///
/// Each resource key maps to a sequence of responses; the last response
/// repeats forever. Keys without a script answer 404.
pub struct FakeCluster {
    reachable: bool,
    cluster_scoped: HashSet<String>,
    unknown: HashSet<String>,
    scripts: Mutex<HashMap<String, Vec<Result<DynamicObject, FetchError>>>>,
    get_delay: Duration,
    pub version_calls: AtomicUsize,
    pub resolve_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self {
            reachable: true,
            cluster_scoped: [
                "Namespace",
                "CustomResourceDefinition",
                "ClusterRole",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            unknown: HashSet::new(),
            scripts: Mutex::new(HashMap::new()),
            get_delay: Duration::ZERO,
            version_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Discovery does not know this kind.
    pub fn without_kind(mut self, kind: &str) -> Self {
        self.unknown.insert(kind.to_string());
        self
    }

    pub fn object(self, key: &str, object: DynamicObject) -> Self {
        self.sequence(key, vec![Ok(object)])
    }

    pub fn sequence(
        mut self,
        key: &str,
        responses: Vec<Result<DynamicObject, FetchError>>,
    ) -> Self {
        self.scripts
            .get_mut()
            .unwrap()
            .insert(key.to_string(), responses);
        self
    }

    pub fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = delay;
        self
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn resolves(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn server_version(&self) -> Result<String, FetchError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            Ok("v1.30.4".into())
        } else {
            Err(FetchError::Transient(
                "dial tcp 127.0.0.1:6443: connect: connection refused".into(),
            ))
        }
    }

    async fn resolve_kind(
        &self,
        gvk: &GroupVersionKind,
    ) -> Result<ResolvedKind, FetchError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.unknown.contains(&gvk.kind) {
            return Err(FetchError::Fatal(format!(
                "no matches for kind \"{}\"",
                gvk.kind
            )));
        }
        if self.cluster_scoped.contains(&gvk.kind) {
            Ok(ResolvedKind::cluster_scoped(gvk))
        } else {
            Ok(ResolvedKind::namespaced(gvk))
        }
    }

    async fn get(
        &self,
        resource: &ResourceInfo,
    ) -> Result<DynamicObject, FetchError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if !self.get_delay.is_zero() {
            tokio::time::sleep(self.get_delay).await;
        }
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&resource.key()) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) => queue[0].clone(),
            None => Err(FetchError::NotFound),
        }
    }

    fn default_namespace(&self) -> &str {
        "default"
    }
}

/// Memory store that counts lookups.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryReleaseStore,
    pub lookups: Arc<AtomicUsize>,
}

impl CountingStore {
    pub async fn with_releases(
        releases: impl IntoIterator<Item = Release>,
    ) -> Self {
        Self {
            inner: MemoryReleaseStore::with_releases(releases).await,
            lookups: Arc::default(),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageHealth for CountingStore {
    async fn health(&self) -> StorageResult<()> {
        self.inner.health().await
    }
}

#[async_trait]
impl ReleaseStore for CountingStore {
    async fn last(&self, name: &str) -> StorageResult<Release> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.last(name).await
    }

    async fn history(&self, name: &str) -> StorageResult<Vec<Release>> {
        self.inner.history(name).await
    }

    async fn store(&self, release: &Release) -> StorageResult<()> {
        self.inner.store(release).await
    }
}

pub fn wait_action(
    cluster: Arc<FakeCluster>,
    store: CountingStore,
    opts: WaitOptions,
) -> Wait {
    let orchestrator =
        KubeOrchestrator::new(cluster).with_poll_interval(POLL_INTERVAL);
    Wait::new(
        ReadinessWaiter::new(Arc::new(orchestrator), opts),
        ReleaseLocator::new(Arc::new(store)),
    )
}

/// Store holding the given versions of the `shop` release.
pub async fn shop_store(versions: &[u32]) -> CountingStore {
    CountingStore::with_releases(versions.iter().copied().map(shop_release))
        .await
}

pub fn options(timeout_secs: u64, wait_for_jobs: bool) -> WaitOptions {
    WaitOptions {
        timeout: Duration::from_secs(timeout_secs),
        wait_for_jobs,
    }
}

// --- fixtures ---

pub const SHOP_MANIFEST: &str = "\
---
# Source: shop/templates/configmap.yaml
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  mode: production
---
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  selector: {app: web}
  ports: [{port: 80}]
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 2
  selector:
    matchLabels: {app: web}
  template:
    metadata:
      labels: {app: web}
    spec:
      containers: [{name: web, image: nginx}]
---
apiVersion: batch/v1
kind: Job
metadata:
  name: migrate
spec:
  template:
    spec:
      restartPolicy: Never
      containers: [{name: migrate, image: busybox}]
";

pub const SERVICE_KEY: &str = "Service/shop/web";
pub const DEPLOYMENT_KEY: &str = "Deployment/shop/web";
pub const JOB_KEY: &str = "Job/shop/migrate";

pub fn shop_release(version: u32) -> Release {
    Release::new("shop", version, SHOP_MANIFEST).with_namespace("shop")
}

fn dynamic(v: Value) -> DynamicObject {
    serde_json::from_value(v).expect("valid fixture")
}

pub fn service() -> DynamicObject {
    dynamic(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {"name": "web", "namespace": "shop"},
        "spec": {"type": "ClusterIP", "clusterIP": "10.96.0.12"},
        "status": {"loadBalancer": {}}
    }))
}

pub fn deployment(replicas: i32, available: i32) -> DynamicObject {
    dynamic(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {"name": "web", "namespace": "shop", "generation": 1},
        "spec": {
            "replicas": replicas,
            "selector": {"matchLabels": {"app": "web"}},
            "template": {"metadata": {"labels": {"app": "web"}}}
        },
        "status": {
            "observedGeneration": 1,
            "replicas": replicas,
            "updatedReplicas": replicas,
            "readyReplicas": available,
            "availableReplicas": available
        }
    }))
}

fn job(status: Value) -> DynamicObject {
    dynamic(json!({
        "apiVersion": "batch/v1",
        "kind": "Job",
        "metadata": {"name": "migrate", "namespace": "shop"},
        "spec": {"completions": 1, "backoffLimit": 2, "template": {}},
        "status": status
    }))
}

pub fn job_running() -> DynamicObject {
    job(json!({"active": 1}))
}

pub fn job_complete() -> DynamicObject {
    job(json!({
        "succeeded": 1,
        "conditions": [{"type": "Complete", "status": "True"}]
    }))
}

pub fn job_failed() -> DynamicObject {
    job(json!({
        "failed": 3,
        "conditions": [{
            "type": "Failed",
            "status": "True",
            "reason": "BackoffLimitExceeded",
            "message": "Job has reached the specified backoff limit"
        }]
    }))
}

/// Cluster where every resource of [`SHOP_MANIFEST`] exists; the Job is
/// still running.
pub fn healthy_shop() -> FakeCluster {
    FakeCluster::new()
        .object(SERVICE_KEY, service())
        .object(DEPLOYMENT_KEY, deployment(2, 2))
        .object(JOB_KEY, job_running())
}
