//! Concurrent readiness polling under one shared deadline.

use std::fmt;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout_at};
use tracing::{debug, instrument, trace, warn};

use crate::cluster::{ClusterApi, FetchError};
use crate::readiness::{Predicate, PredicateTable, Readiness};
use crate::resource::{ResourceInfo, ResourceSet};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug)]
pub struct PollOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }
}

/// A resource still not ready when the deadline fired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingResource {
    pub resource: String,
    /// Last reason observed; `None` if no check completed in time.
    pub reason: Option<String>,
}

impl fmt::Display for PendingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", self.resource, reason),
            None => write!(f, "{} (not checked yet)", self.resource),
        }
    }
}

pub(crate) fn join_pending(pending: &[PendingResource]) -> String {
    pending
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReadinessError {
    #[error(
        "timed out after {elapsed:?} waiting for: {}",
        join_pending(.pending)
    )]
    Timeout {
        elapsed: Duration,
        pending: Vec<PendingResource>,
    },
    #[error("{resource}: {reason}")]
    Fatal { resource: String, reason: String },
}

/// Poll every resource that has a readiness rule until all are ready, one
/// fails, or `opts.timeout` elapses.
///
/// Resources without a rule count as ready and are never fetched.
#[instrument(
    level = "debug",
    skip_all,
    fields(resources = resources.len(), timeout = ?opts.timeout)
)]
pub async fn wait_for_resources<C>(
    cluster: &C,
    resources: &ResourceSet,
    table: &PredicateTable,
    opts: PollOptions,
) -> Result<(), ReadinessError>
where
    C: ClusterApi + ?Sized,
{
    let started = Instant::now();
    let deadline = started + opts.timeout;

    let mut tracked: Vec<(String, watch::Receiver<Option<String>>)> =
        Vec::new();
    let mut polls = FuturesUnordered::new();
    for resource in resources {
        let Some(predicate) = table.lookup(resource.group(), resource.kind())
        else {
            trace!(resource = %resource, "no readiness rule; ready");
            continue;
        };
        let (tx, rx) = watch::channel(None);
        let slot = tracked.len();
        tracked.push((resource.key(), rx));
        polls.push(poll_resource(
            cluster,
            slot,
            resource,
            predicate,
            opts.interval,
            tx,
        ));
    }

    let mut done = vec![false; tracked.len()];
    let mut ready = 0usize;
    loop {
        match timeout_at(deadline, polls.next()).await {
            Ok(Some((slot, Ok(())))) => {
                done[slot] = true;
                ready += 1;
                debug!(
                    resource = %tracked[slot].0,
                    ready,
                    total = tracked.len(),
                    "resource ready"
                );
            }
            Ok(Some((slot, Err(reason)))) => {
                return Err(ReadinessError::Fatal {
                    resource: tracked[slot].0.clone(),
                    reason,
                });
            }
            Ok(None) => {
                debug!(elapsed = ?started.elapsed(), "all resources ready");
                return Ok(());
            }
            Err(_) => {
                // dropping `polls` abandons in-flight requests
                let pending = tracked
                    .iter()
                    .zip(&done)
                    .filter(|(_, done)| !**done)
                    .map(|((resource, rx), _)| PendingResource {
                        resource: resource.clone(),
                        reason: rx.borrow().clone(),
                    })
                    .collect();
                return Err(ReadinessError::Timeout {
                    elapsed: started.elapsed(),
                    pending,
                });
            }
        }
    }
}

async fn poll_resource<C>(
    cluster: &C,
    slot: usize,
    resource: &ResourceInfo,
    predicate: Predicate,
    every: Duration,
    reason: watch::Sender<Option<String>>,
) -> (usize, Result<(), String>)
where
    C: ClusterApi + ?Sized,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let outcome = match cluster.get(resource).await {
            Ok(live) => predicate(&live),
            Err(FetchError::NotFound) => Readiness::not_ready("not found"),
            Err(FetchError::Transient(msg)) => {
                warn!(
                    resource = %resource,
                    error = %msg,
                    "transient fetch error; retrying"
                );
                Readiness::not_ready(format!("transient error: {msg}"))
            }
            Err(FetchError::Fatal(msg)) => Readiness::failed(msg),
        };
        match outcome {
            Readiness::Ready => return (slot, Ok(())),
            Readiness::NotReady(why) => {
                trace!(resource = %resource, reason = %why, "not ready");
                reason.send_replace(Some(why));
            }
            Readiness::Failed(why) => return (slot, Err(why)),
        }
    }
}
