use std::sync::Arc;
use std::time::Duration;

use kwait_models::Release;
use tracing::{debug, instrument};

use crate::config::DEFAULT_TIMEOUT;
use crate::error::{WaitError, WaitPhase};
use crate::orchestrator::{Orchestrator, OrchestratorError};
use crate::poller::ReadinessError;

#[derive(Clone, Copy, Debug)]
pub struct WaitOptions {
    /// Bound on the poll phase, shared by every resource.
    pub timeout: Duration,
    /// Require Jobs to complete instead of merely exist.
    pub wait_for_jobs: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            wait_for_jobs: false,
        }
    }
}

/// Builds a release's manifest and blocks until its resources are ready.
#[derive(Clone)]
pub struct ReadinessWaiter {
    orchestrator: Arc<dyn Orchestrator>,
    opts: WaitOptions,
}

impl ReadinessWaiter {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        opts: WaitOptions,
    ) -> Self {
        Self { orchestrator, opts }
    }

    pub async fn ensure_reachable(&self) -> Result<(), WaitError> {
        self.orchestrator.is_reachable().await.map_err(|source| {
            debug!(phase = %WaitPhase::ConnectivityFailed, "wait transition");
            WaitError::Connectivity { source }
        })?;
        debug!(phase = %WaitPhase::ConnectivityChecked, "wait transition");
        Ok(())
    }

    /// Reachability check followed by [`ReadinessWaiter::perform_wait`].
    pub async fn run(&self, release: &Release) -> Result<(), WaitError> {
        self.ensure_reachable().await?;
        self.perform_wait(release).await
    }

    /// Build and poll; the cluster is assumed reachable.
    #[instrument(
        level = "debug",
        skip_all,
        fields(
            release = %release.name,
            version = release.version,
            jobs = self.opts.wait_for_jobs
        )
    )]
    pub async fn perform_wait(
        &self,
        release: &Release,
    ) -> Result<(), WaitError> {
        let resources = self
            .orchestrator
            .build(&release.manifest, release.namespace.as_deref())
            .await
            .map_err(|source| {
                debug!(phase = %WaitPhase::BuildFailed, "wait transition");
                WaitError::ManifestBuild {
                    release: release.name.clone(),
                    source,
                }
            })?;
        debug!(
            phase = %WaitPhase::ManifestBuilt,
            resources = resources.len(),
            "wait transition"
        );

        debug!(
            phase = %WaitPhase::Polling,
            timeout = ?self.opts.timeout,
            "wait transition"
        );
        let polled = if self.opts.wait_for_jobs {
            self.orchestrator
                .wait_with_jobs(&resources, self.opts.timeout)
                .await
        } else {
            self.orchestrator.wait(&resources, self.opts.timeout).await
        };

        let result = polled.map_err(|e| into_wait_error(&release.name, e));
        let phase = match &result {
            Ok(()) => WaitPhase::Succeeded,
            Err(e) => e.phase(),
        };
        debug!(%phase, "wait transition");
        result
    }
}

fn into_wait_error(release: &str, err: OrchestratorError) -> WaitError {
    let release = release.to_string();
    match err {
        OrchestratorError::Readiness(ReadinessError::Timeout {
            elapsed,
            pending,
        }) => WaitError::Timeout {
            release,
            elapsed,
            pending,
        },
        OrchestratorError::Readiness(ReadinessError::Fatal {
            resource,
            reason,
        }) => WaitError::FatalResource {
            release,
            resource,
            reason,
        },
        source => WaitError::Orchestrator { release, source },
    }
}
