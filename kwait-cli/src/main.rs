use clap::Parser;
use envconfig::Envconfig;
use kwait_cli::KwaitCli;
use kwait_engine::config::WaitConfig;
use kwait_engine::init_tracing;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("warn");

    if let Err(e) = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::aws_lc_rs::default_provider(),
    ) {
        tracing::debug!(?e, "CryptoProvider already installed; proceeding");
    }

    let cli = KwaitCli::parse();
    let cfg = WaitConfig::init_from_env()?;
    kwait_cli::run(cli, cfg).await
}
