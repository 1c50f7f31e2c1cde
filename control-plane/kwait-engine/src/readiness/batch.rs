use k8s_openapi::api::batch::v1::Job;
use kube::core::DynamicObject;

use super::{Readiness, decode};

/// Kubernetes default for `spec.backoffLimit`.
const DEFAULT_BACKOFF_LIMIT: i32 = 6;

/// Used for Jobs when completion is not awaited: getting the object back
/// from the API server is enough.
pub fn exists(_: &DynamicObject) -> Readiness {
    Readiness::Ready
}

/// A Job is ready when it completed; a Job that exhausted its retries or
/// reports a `Failed` condition is a terminal failure.
pub fn job_complete(obj: &DynamicObject) -> Readiness {
    let job: Job = match decode(obj) {
        Ok(j) => j,
        Err(r) => return r,
    };
    let spec = job.spec.unwrap_or_default();
    let Some(status) = job.status else {
        return Readiness::not_ready("job has not started");
    };

    let condition = |type_: &str| {
        status
            .conditions
            .iter()
            .flatten()
            .find(|c| c.type_ == type_ && c.status == "True")
    };
    if let Some(c) = condition("Failed") {
        return Readiness::failed(format!(
            "job failed: {}",
            c.message
                .as_deref()
                .or(c.reason.as_deref())
                .unwrap_or("no reason reported")
        ));
    }
    let failed = status.failed.unwrap_or(0);
    let backoff_limit = spec.backoff_limit.unwrap_or(DEFAULT_BACKOFF_LIMIT);
    if failed > backoff_limit {
        return Readiness::failed(format!(
            "job failed: {failed} failed pods exceed backoff limit \
             {backoff_limit}"
        ));
    }
    if condition("Complete").is_some() {
        return Readiness::Ready;
    }

    let succeeded = status.succeeded.unwrap_or(0);
    match spec.completions {
        Some(completions) if succeeded >= completions => Readiness::Ready,
        Some(completions) => Readiness::not_ready(format!(
            "{succeeded}/{completions} completions"
        )),
        // work-queue jobs finish once any pod succeeded
        None if succeeded > 0 => Readiness::Ready,
        None => Readiness::not_ready("job has not completed"),
    }
}
