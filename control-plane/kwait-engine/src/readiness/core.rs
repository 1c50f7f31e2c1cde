use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, Pod, ReplicationController, Service,
};
use kube::core::DynamicObject;

use super::{Readiness, decode, generation_observed};

/// Ready when the `Ready` condition is true or the pod ran to completion.
pub fn pod_ready(obj: &DynamicObject) -> Readiness {
    let pod: Pod = match decode(obj) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let Some(status) = pod.status else {
        return Readiness::not_ready("pod status not yet reported");
    };
    match status.phase.as_deref() {
        Some("Succeeded") => return Readiness::Ready,
        Some("Failed") => {
            return Readiness::failed(format!(
                "pod failed: {}",
                status
                    .message
                    .or(status.reason)
                    .unwrap_or_else(|| "no reason reported".into())
            ));
        }
        _ => {}
    }
    let ready = status
        .conditions
        .iter()
        .flatten()
        .any(|c| c.type_ == "Ready" && c.status == "True");
    if ready {
        Readiness::Ready
    } else {
        Readiness::not_ready(format!(
            "pod not ready (phase {})",
            status.phase.as_deref().unwrap_or("Unknown")
        ))
    }
}

pub fn pvc_bound(obj: &DynamicObject) -> Readiness {
    let pvc: PersistentVolumeClaim = match decode(obj) {
        Ok(p) => p,
        Err(r) => return r,
    };
    match pvc.status.and_then(|s| s.phase).as_deref() {
        Some("Bound") => Readiness::Ready,
        Some("Lost") => {
            Readiness::failed("persistent volume claim lost its volume")
        }
        other => Readiness::not_ready(format!(
            "claim is {}",
            other.unwrap_or("Pending")
        )),
    }
}

/// ExternalName services are always ready; others need a cluster IP and,
/// for load balancers, an ingress point.
pub fn service_ready(obj: &DynamicObject) -> Readiness {
    let svc: Service = match decode(obj) {
        Ok(s) => s,
        Err(r) => return r,
    };
    let spec = svc.spec.unwrap_or_default();
    let type_ = spec.type_.as_deref().unwrap_or("ClusterIP");
    if type_ == "ExternalName" {
        return Readiness::Ready;
    }
    if spec.cluster_ip.as_deref().unwrap_or("").is_empty() {
        return Readiness::not_ready("cluster IP not assigned");
    }
    if type_ == "LoadBalancer" {
        let has_external_ip = spec
            .external_ips
            .as_ref()
            .is_some_and(|ips| !ips.is_empty());
        let has_ingress = svc
            .status
            .and_then(|s| s.load_balancer)
            .and_then(|lb| lb.ingress)
            .is_some_and(|ing| !ing.is_empty());
        if !has_external_ip && !has_ingress {
            return Readiness::not_ready("load balancer ingress not assigned");
        }
    }
    Readiness::Ready
}

pub fn replication_controller_ready(obj: &DynamicObject) -> Readiness {
    let rc: ReplicationController = match decode(obj) {
        Ok(r) => r,
        Err(r) => return r,
    };
    let Some(status) = rc.status else {
        return Readiness::not_ready("status not yet reported");
    };
    if let Err(r) =
        generation_observed(rc.metadata.generation, status.observed_generation)
    {
        return r;
    }
    let want = rc.spec.and_then(|s| s.replicas).unwrap_or(1);
    let ready = status.ready_replicas.unwrap_or(0);
    if ready < want {
        return Readiness::not_ready(format!("{ready}/{want} replicas ready"));
    }
    Readiness::Ready
}
