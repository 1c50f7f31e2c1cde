//! Per-kind readiness predicates and the table that selects them.
//!
//! A predicate is a pure function over the live object. Kinds missing from
//! the table are treated as ready as soon as they were applied.

pub mod apps;
pub mod batch;
pub mod core;
pub mod extensions;

use std::collections::HashMap;

use kube::core::DynamicObject;
use serde::de::DeserializeOwned;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady(String),
    /// Terminal failure; waiting longer cannot make the resource ready.
    Failed(String),
}

impl Readiness {
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Readiness::NotReady(reason.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Readiness::Failed(reason.into())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

pub type Predicate = fn(&DynamicObject) -> Readiness;

/// Mapping `(api group, kind) → predicate` with an open-world fallback.
#[derive(Clone, Default)]
pub struct PredicateTable {
    rules: HashMap<(String, String), Predicate>,
}

impl PredicateTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in rules. `wait_for_jobs` selects whether Jobs must complete
    /// or only exist.
    pub fn builtin(wait_for_jobs: bool) -> Self {
        let job: Predicate = if wait_for_jobs {
            batch::job_complete
        } else {
            batch::exists
        };
        Self::empty()
            .with("", "Pod", core::pod_ready)
            .with("", "PersistentVolumeClaim", core::pvc_bound)
            .with("", "Service", core::service_ready)
            .with(
                "",
                "ReplicationController",
                core::replication_controller_ready,
            )
            .with("apps", "Deployment", apps::deployment_ready)
            .with("apps", "StatefulSet", apps::statefulset_ready)
            .with("apps", "DaemonSet", apps::daemonset_ready)
            .with("apps", "ReplicaSet", apps::replicaset_ready)
            .with("batch", "Job", job)
            .with(
                "apiextensions.k8s.io",
                "CustomResourceDefinition",
                extensions::crd_established,
            )
    }

    pub fn with(
        mut self,
        group: &str,
        kind: &str,
        predicate: Predicate,
    ) -> Self {
        self.rules
            .insert((group.to_string(), kind.to_string()), predicate);
        self
    }

    /// `None` means the kind has no readiness semantics and counts as ready.
    pub fn lookup(&self, group: &str, kind: &str) -> Option<Predicate> {
        self.rules
            .get(&(group.to_string(), kind.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Decode a live dynamic object into its typed form.
pub(crate) fn decode<K: DeserializeOwned>(
    obj: &DynamicObject,
) -> Result<K, Readiness> {
    serde_json::to_value(obj)
        .and_then(serde_json::from_value)
        .map_err(|e| {
            Readiness::failed(format!("unable to decode live object: {e}"))
        })
}

/// Generation check shared by workload controllers.
pub(crate) fn generation_observed(
    generation: Option<i64>,
    observed: Option<i64>,
) -> Result<(), Readiness> {
    let generation = generation.unwrap_or(0);
    let observed = observed.unwrap_or(0);
    if observed < generation {
        return Err(Readiness::not_ready(format!(
            "observed generation {observed} behind desired {generation}"
        )));
    }
    Ok(())
}
