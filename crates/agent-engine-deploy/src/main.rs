use std::process::ExitCode;

use agent_engine_client::{EngineClientConfig, HttpRegistrar, init_observability};
use agent_engine_deploy::cli::Cli;
use agent_engine_deploy::deploy;
use anyhow::Context as _;
use clap::Parser as _;
use tracing::error;

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let request = cli
        .registration_request()
        .context("assembling registration request")?;
    let config = EngineClientConfig::from_env(&cli.project, &cli.location, &cli.bucket)
        .context("loading client configuration")?;
    let registrar = HttpRegistrar::new(config)?;
    let mut stdout = std::io::stdout().lock();
    deploy(&registrar, request, &mut stdout).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_observability();
    let cli = Cli::parse();

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "deployment failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
