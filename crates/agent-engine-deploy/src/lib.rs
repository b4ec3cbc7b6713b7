//! Registers a locally built agent with a managed Agent Engine runtime.

pub mod cli;
pub mod requirements;

use std::io::Write;

use agent_engine_client::{ClientError, RegistrationRequest, Registrar, ResourceHandle};
use tracing::info;

/// Errors that end a deployment.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Submits `request` and prints the created resource name to `out`.
///
/// Registrar failures are returned unchanged; nothing is retried.
pub async fn deploy<W: Write>(
    registrar: &dyn Registrar,
    request: RegistrationRequest,
    out: &mut W,
) -> Result<ResourceHandle, DeployError> {
    info!(
        agent = %request.agent.display_name,
        requirements = request.requirements.len(),
        extra_packages = request.extra_packages.len(),
        "registering agent"
    );
    let handle = registrar.create(request).await?;
    writeln!(out, "{}", handle.resource_name)?;
    Ok(handle)
}
