pub mod action;
pub mod cluster;
pub mod config;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod orchestrator;
pub mod poller;
pub mod readiness;
pub mod resource;
pub mod waiter;

pub use action::Wait;
pub use error::{WaitError, WaitPhase};
pub use locator::ReleaseLocator;
pub use orchestrator::{KubeOrchestrator, Orchestrator, OrchestratorError};
pub use resource::{ResourceInfo, ResourceSet};
pub use waiter::{ReadinessWaiter, WaitOptions};

use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

pub fn init_tracing(default_env: &str) {
    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .from_env_lossy()
        .add_directive(
            default_env
                .parse()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        );

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
