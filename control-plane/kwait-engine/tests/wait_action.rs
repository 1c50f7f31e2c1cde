use std::sync::Arc;
use std::time::Duration;

use kwait_engine::cluster::FetchError;
use kwait_engine::{WaitError, WaitPhase};
use kwait_models::Release;
use kwait_storage::ReleaseStore;
use tokio::time::Instant;

mod common;
use common::*;

#[tokio::test(start_paused = true)]
async fn invalid_release_name_never_touches_storage() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(healthy_shop());
    let action = wait_action(cluster, store.clone(), options(30, false));

    let long = "a".repeat(54);
    for name in ["Shop", "shop_v2", "-shop", long.as_str()] {
        let err = action.run(name).await.unwrap_err();
        assert!(
            matches!(err, WaitError::InvalidReleaseName { .. }),
            "{name}: {err:?}"
        );
    }
    assert_eq!(store.lookups(), 0);
}

#[tokio::test(start_paused = true)]
async fn unknown_release_is_not_found() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(healthy_shop());
    let action = wait_action(cluster.clone(), store, options(30, false));

    let err = action.run("cart").await.unwrap_err();
    assert!(matches!(
        err,
        WaitError::ReleaseNotFound { ref name } if name == "cart"
    ));
    assert_eq!(err.to_string(), "release: not found: cart");
    assert_eq!(cluster.resolves(), 0);
}

#[tokio::test(start_paused = true)]
async fn unreachable_cluster_stops_before_anything_else() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(FakeCluster::unreachable());
    let opts = options(30, false);
    let action = wait_action(cluster.clone(), store.clone(), opts);

    let err = action.run("shop").await.unwrap_err();
    assert!(matches!(err, WaitError::Connectivity { .. }), "{err:?}");
    assert_eq!(err.phase(), WaitPhase::ConnectivityFailed);
    assert_eq!(store.lookups(), 0);
    assert_eq!(cluster.resolves(), 0);
    assert_eq!(cluster.gets(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_manifest_fails_build_without_fetching() {
    let manifests = [
        "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: [\n",
        "apiVersion: v1\nkind: ConfigMap\nmetadata: {}\n",
        "kind: Pod\nmetadata: {name: p}\n",
        "- just\n- a list\n",
    ];
    for manifest in manifests {
        let store =
            CountingStore::with_releases([Release::new("broken", 1, manifest)])
                .await;
        let cluster = Arc::new(FakeCluster::new());
        let action = wait_action(cluster.clone(), store, options(30, false));

        let err = action.run("broken").await.unwrap_err();
        assert!(
            matches!(
                err,
                WaitError::ManifestBuild { ref release, .. }
                    if release == "broken"
            ),
            "{manifest:?}: {err:?}"
        );
        assert_eq!(err.phase(), WaitPhase::BuildFailed);
        assert_eq!(cluster.gets(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn kind_unknown_to_discovery_fails_build() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(healthy_shop().without_kind("Job"));
    let action = wait_action(cluster.clone(), store, options(30, false));

    let err = action.run("shop").await.unwrap_err();
    assert!(matches!(err, WaitError::ManifestBuild { .. }), "{err:?}");
    assert_eq!(cluster.gets(), 0);
}

#[tokio::test(start_paused = true)]
async fn ready_release_succeeds_immediately() {
    let store = shop_store(&[1, 2]).await;
    let cluster = Arc::new(healthy_shop());
    let action = wait_action(cluster.clone(), store, options(30, false));

    let started = Instant::now();
    let release = action.run("shop").await.unwrap();
    assert_eq!(release.version, 2);
    assert!(started.elapsed() < Duration::from_secs(1));
    // ConfigMap has no readiness rule and is never fetched
    assert_eq!(cluster.gets(), 3);
}

#[tokio::test(start_paused = true)]
async fn never_ready_resource_times_out_at_deadline() {
    let store = shop_store(&[1]).await;
    let cluster =
        Arc::new(healthy_shop().object(DEPLOYMENT_KEY, deployment(2, 1)));
    let action = wait_action(cluster, store, options(10, false));

    let started = Instant::now();
    let err = action.run("shop").await.unwrap_err();
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(10), "{waited:?}");
    assert!(waited <= Duration::from_secs(10) + POLL_INTERVAL, "{waited:?}");

    match &err {
        WaitError::Timeout { release, pending, .. } => {
            assert_eq!(release, "shop");
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].resource, DEPLOYMENT_KEY);
            assert_eq!(
                pending[0].reason.as_deref(),
                Some("1/2 replicas available")
            );
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(err.phase(), WaitPhase::TimedOut);
    assert!(
        err.to_string()
            .contains("Deployment/shop/web (1/2 replicas available)")
    );
}

#[tokio::test(start_paused = true)]
async fn incomplete_job_is_fine_without_wait_for_jobs() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(healthy_shop());
    let action = wait_action(cluster, store, options(30, false));
    action.run("shop").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn incomplete_job_blocks_with_wait_for_jobs() {
    let store = shop_store(&[1]).await;
    let action = wait_action(Arc::new(healthy_shop()), store, options(5, true));

    let err = action.run("shop").await.unwrap_err();
    match err {
        WaitError::Timeout { pending, .. } => {
            let names: Vec<_> =
                pending.iter().map(|p| p.resource.as_str()).collect();
            assert_eq!(names, [JOB_KEY]);
            assert_eq!(pending[0].reason.as_deref(), Some("0/1 completions"));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn failed_job_is_fatal_well_before_timeout() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(healthy_shop().object(JOB_KEY, job_failed()));
    let action = wait_action(cluster, store, options(300, true));

    let started = Instant::now();
    let err = action.run("shop").await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(1));
    match &err {
        WaitError::FatalResource { release, resource, reason } => {
            assert_eq!(release, "shop");
            assert_eq!(resource, JOB_KEY);
            assert_eq!(
                reason,
                "job failed: Job has reached the specified backoff limit"
            );
        }
        other => panic!("expected fatal resource error, got {other:?}"),
    }
    assert_eq!(err.phase(), WaitPhase::FatalResourceError);
}

#[tokio::test(start_paused = true)]
async fn job_completing_later_is_awaited() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(healthy_shop().sequence(
        JOB_KEY,
        vec![Ok(job_running()), Ok(job_running()), Ok(job_complete())],
    ));
    let action = wait_action(cluster, store, options(30, true));

    let started = Instant::now();
    action.run("shop").await.unwrap();
    assert_eq!(started.elapsed(), POLL_INTERVAL * 2);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_do_not_fail_the_wait() {
    let store = shop_store(&[1]).await;
    let cluster = Arc::new(healthy_shop().sequence(
        DEPLOYMENT_KEY,
        vec![
            Err(FetchError::Transient("429 Too Many Requests".into())),
            Err(FetchError::Transient("http2 connection reset".into())),
            Err(FetchError::NotFound),
            Ok(deployment(2, 2)),
        ],
    ));
    let action = wait_action(cluster, store, options(30, false));
    action.run("shop").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slow_requests_are_abandoned_at_deadline() {
    let store = shop_store(&[1]).await;
    let cluster =
        Arc::new(healthy_shop().with_get_delay(Duration::from_secs(60)));
    let action = wait_action(cluster, store, options(5, false));

    let started = Instant::now();
    let err = action.run("shop").await.unwrap_err();
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    match err {
        WaitError::Timeout { pending, .. } => {
            assert_eq!(pending.len(), 3);
            assert!(pending.iter().all(|p| p.reason.is_none()));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn kinds_without_rules_are_ready_without_fetching() {
    let manifest = "\
apiVersion: example.com/v1
kind: Widget
metadata: {name: w}
---
apiVersion: v1
kind: Namespace
metadata: {name: shop}
";
    let store =
        CountingStore::with_releases([Release::new("widgets", 1, manifest)])
            .await;
    let cluster = Arc::new(FakeCluster::new());
    let action = wait_action(cluster.clone(), store, options(5, true));

    action.run("widgets").await.unwrap();
    assert_eq!(cluster.resolves(), 2);
    assert_eq!(cluster.gets(), 0);
}

#[tokio::test(start_paused = true)]
async fn empty_manifest_is_ready() {
    let store =
        CountingStore::with_releases([Release::new("empty", 1, "---\n")]).await;
    let cluster = Arc::new(FakeCluster::new());
    let action = wait_action(cluster, store, options(5, true));
    action.run("empty").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn repeated_waits_are_idempotent() {
    let store = shop_store(&[1, 2]).await;
    let before = store.history("shop").await.unwrap();
    let cluster = Arc::new(healthy_shop());
    let action = wait_action(cluster, store.clone(), options(30, false));

    let first = action.run("shop").await.unwrap();
    let second = action.run("shop").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.history("shop").await.unwrap(), before);
}
