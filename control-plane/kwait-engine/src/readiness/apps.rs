use k8s_openapi::api::apps::v1::{
    DaemonSet, Deployment, ReplicaSet, StatefulSet,
};
use kube::core::DynamicObject;

use super::{Readiness, decode, generation_observed};

const PROGRESS_DEADLINE_EXCEEDED: &str = "ProgressDeadlineExceeded";

/// A Deployment is ready once the controller observed the latest
/// generation and every desired replica is updated and available.
/// Paused deployments are not waited on.
pub fn deployment_ready(obj: &DynamicObject) -> Readiness {
    let dep: Deployment = match decode(obj) {
        Ok(d) => d,
        Err(r) => return r,
    };
    let spec = dep.spec.unwrap_or_default();
    if spec.paused == Some(true) {
        return Readiness::Ready;
    }
    let Some(status) = dep.status else {
        return Readiness::not_ready("status not yet reported");
    };
    // conditions describe the observed generation only
    if let Err(r) =
        generation_observed(dep.metadata.generation, status.observed_generation)
    {
        return r;
    }
    if let Some(cond) = status.conditions.iter().flatten().find(|c| {
        c.type_ == "Progressing"
            && c.status == "False"
            && c.reason.as_deref() == Some(PROGRESS_DEADLINE_EXCEEDED)
    }) {
        return Readiness::failed(format!(
            "rollout exceeded its progress deadline: {}",
            cond.message.as_deref().unwrap_or(PROGRESS_DEADLINE_EXCEEDED)
        ));
    }

    let want = spec.replicas.unwrap_or(1);
    let updated = status.updated_replicas.unwrap_or(0);
    if updated < want {
        return Readiness::not_ready(format!(
            "{updated}/{want} replicas updated"
        ));
    }
    let total = status.replicas.unwrap_or(0);
    if total > updated {
        return Readiness::not_ready(format!(
            "{} old replicas pending termination",
            total - updated
        ));
    }
    let available = status.available_replicas.unwrap_or(0);
    if available < want {
        return Readiness::not_ready(format!(
            "{available}/{want} replicas available"
        ));
    }
    Readiness::Ready
}

pub fn statefulset_ready(obj: &DynamicObject) -> Readiness {
    let sts: StatefulSet = match decode(obj) {
        Ok(s) => s,
        Err(r) => return r,
    };
    let spec = sts.spec.unwrap_or_default();
    let strategy = spec.update_strategy.unwrap_or_default();
    if strategy.type_.as_deref() == Some("OnDelete") {
        return Readiness::Ready;
    }
    let Some(status) = sts.status else {
        return Readiness::not_ready("status not yet reported");
    };
    if let Err(r) =
        generation_observed(sts.metadata.generation, status.observed_generation)
    {
        return r;
    }

    let want = spec.replicas.unwrap_or(1);
    let partition = strategy
        .rolling_update
        .and_then(|ru| ru.partition)
        .unwrap_or(0);
    let ready = status.ready_replicas.unwrap_or(0);
    if ready < want {
        return Readiness::not_ready(format!("{ready}/{want} replicas ready"));
    }
    let expected_updated = (want - partition).max(0);
    let updated = status.updated_replicas.unwrap_or(0);
    if updated < expected_updated {
        return Readiness::not_ready(format!(
            "{updated}/{expected_updated} replicas updated"
        ));
    }
    if partition == 0 && status.current_revision != status.update_revision {
        return Readiness::not_ready(format!(
            "revision {} not yet rolled out (current {})",
            status.update_revision.as_deref().unwrap_or("?"),
            status.current_revision.as_deref().unwrap_or("?")
        ));
    }
    Readiness::Ready
}

pub fn daemonset_ready(obj: &DynamicObject) -> Readiness {
    let ds: DaemonSet = match decode(obj) {
        Ok(d) => d,
        Err(r) => return r,
    };
    let spec = ds.spec.unwrap_or_default();
    if spec
        .update_strategy
        .as_ref()
        .and_then(|s| s.type_.as_deref())
        == Some("OnDelete")
    {
        return Readiness::Ready;
    }
    let Some(status) = ds.status else {
        return Readiness::not_ready("status not yet reported");
    };
    if let Err(r) =
        generation_observed(ds.metadata.generation, status.observed_generation)
    {
        return r;
    }

    let desired = status.desired_number_scheduled;
    let updated = status.updated_number_scheduled.unwrap_or(0);
    if updated < desired {
        return Readiness::not_ready(format!(
            "{updated}/{desired} pods updated"
        ));
    }
    if status.number_ready < desired {
        return Readiness::not_ready(format!(
            "{}/{desired} pods ready",
            status.number_ready
        ));
    }
    Readiness::Ready
}

pub fn replicaset_ready(obj: &DynamicObject) -> Readiness {
    let rs: ReplicaSet = match decode(obj) {
        Ok(r) => r,
        Err(r) => return r,
    };
    let Some(status) = rs.status else {
        return Readiness::not_ready("status not yet reported");
    };
    if let Err(r) =
        generation_observed(rs.metadata.generation, status.observed_generation)
    {
        return r;
    }
    let want = rs.spec.and_then(|s| s.replicas).unwrap_or(1);
    let ready = status.ready_replicas.unwrap_or(0);
    if ready < want {
        return Readiness::not_ready(format!("{ready}/{want} replicas ready"));
    }
    Readiness::Ready
}
