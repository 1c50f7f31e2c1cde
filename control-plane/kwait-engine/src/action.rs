use kwait_models::Release;
use tracing::info;

use crate::error::WaitError;
use crate::locator::ReleaseLocator;
use crate::waiter::ReadinessWaiter;

/// Wait for the latest version of a named release to become ready.
///
/// Order is fixed: cluster reachability, release lookup, manifest build,
/// readiness polling. A failing step ends the action.
pub struct Wait {
    waiter: ReadinessWaiter,
    locator: ReleaseLocator,
}

impl Wait {
    pub fn new(waiter: ReadinessWaiter, locator: ReleaseLocator) -> Self {
        Self { waiter, locator }
    }

    /// Returns the release that was waited on.
    pub async fn run(&self, name: &str) -> Result<Release, WaitError> {
        self.waiter.ensure_reachable().await?;

        info!("preparing wait of {name}");
        let release = self.locator.resolve(name).await?;

        info!("performing wait of {name}");
        self.waiter.perform_wait(&release).await?;
        Ok(release)
    }
}
