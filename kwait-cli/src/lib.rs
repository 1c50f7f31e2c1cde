use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kube::Client;
use kwait_engine::cluster::LiveCluster;
use kwait_engine::config::{WaitConfig, invalid_duration, parse_duration};
use kwait_engine::{
    KubeOrchestrator, ReadinessWaiter, ReleaseLocator, Wait, WaitOptions,
};
use kwait_storage::secret::SecretReleaseStore;
use tracing::{debug, info};

#[derive(clap::Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct KwaitCli {
    #[command(subcommand)]
    pub command: KwaitCommands,
    /// Namespace holding the release records
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,
}

#[derive(clap::Subcommand, Clone, Debug)]
pub enum KwaitCommands {
    /// Wait until every resource of a release is ready
    #[clap(aliases = &["w"])]
    Wait(WaitArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct WaitArgs {
    /// Release name
    pub release: String,
    /// Time to wait for resources as a Go duration, e.g. `300s`, `1.5m`,
    /// `1h30m`
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
    /// Also wait for Jobs to complete
    #[arg(long)]
    pub wait_for_jobs: bool,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| invalid_duration(s))
}

pub async fn run(cli: KwaitCli, cfg: WaitConfig) -> anyhow::Result<()> {
    debug!("use option {cli:?}");
    match &cli.command {
        KwaitCommands::Wait(args) => {
            handle_wait(args, cli.namespace.as_deref(), &cfg).await
        }
    }
}

async fn handle_wait(
    args: &WaitArgs,
    namespace: Option<&str>,
    cfg: &WaitConfig,
) -> anyhow::Result<()> {
    let timeout = match args.timeout {
        Some(t) => t,
        None => cfg.default_timeout()?,
    };
    let client = Client::try_default()
        .await
        .context("unable to load kubernetes configuration")?;
    let namespace = namespace
        .map(str::to_string)
        .or_else(|| cfg.namespace.clone())
        .unwrap_or_else(|| client.default_namespace().to_string());
    info!(
        %namespace,
        ?timeout,
        wait_for_jobs = args.wait_for_jobs,
        "starting wait"
    );

    let store = SecretReleaseStore::new(client.clone(), &namespace);
    let orchestrator = KubeOrchestrator::new(LiveCluster::new(client))
        .with_poll_interval(cfg.poll_interval());
    let opts = WaitOptions {
        timeout,
        wait_for_jobs: args.wait_for_jobs,
    };
    let action = Wait::new(
        ReadinessWaiter::new(Arc::new(orchestrator), opts),
        ReleaseLocator::new(Arc::new(store)),
    );

    let release = action.run(&args.release).await?;
    println!("Wait was a success! Release {} is ready.", release.name);
    Ok(())
}
