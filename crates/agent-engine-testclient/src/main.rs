use std::process::ExitCode;

use agent_engine_client::{AgentEngines, EngineClientConfig, init_observability};
use agent_engine_testclient::cli::Cli;
use agent_engine_testclient::{Run, Summary};
use anyhow::Context as _;
use clap::Parser as _;
use tracing::error;

const EXIT_INTERRUPTED: u8 = 130;

async fn run_cli(cli: Cli) -> anyhow::Result<Summary> {
    let config = EngineClientConfig::from_env(&cli.project, &cli.location, &cli.bucket)
        .context("loading client configuration")?;
    let engines = AgentEngines::from_config(config)?;
    let mut run = Run::new(&engines, cli.run_request());
    let mut stdout = std::io::stdout().lock();
    Ok(run.execute(&mut stdout).await?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_observability();
    let cli = Cli::parse();

    tokio::select! {
        result = run_cli(cli) => match result {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                error!(error = ?err, "Error running testclient: {err:#}");
                ExitCode::FAILURE
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            println!("\nInterrupted.");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}
