use std::path::PathBuf;

use agent_engine_client::{AgentDefinition, ClientError, RegistrationRequest};
use clap::Parser;

use crate::requirements::load_requirements;

pub const DEFAULT_PROJECT: &str = "the-byway-473000-u5";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_BUCKET: &str = "gs://next-demo-storage1-us-central1";
pub const DEFAULT_BUNDLE: &str = "./dist/image_scoring-0.1.0-py3-none-any.whl";
pub const DEFAULT_DISPLAY_NAME: &str = "image_scoring";

/// Package a locally built agent and register it with Agent Engine.
#[derive(Debug, Parser)]
#[command(name = "deploy-agent", version)]
pub struct Cli {
    /// Cloud project id
    #[arg(long, env = "AGENT_ENGINE_PROJECT", default_value = DEFAULT_PROJECT)]
    pub project: String,

    /// Region to deploy into
    #[arg(long, env = "AGENT_ENGINE_LOCATION", default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// Staging bucket (gs://...)
    #[arg(long, env = "AGENT_ENGINE_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Serialized agent object produced by the agent build
    #[arg(long)]
    pub agent: PathBuf,

    /// Display name for the created engine
    #[arg(long, default_value = DEFAULT_DISPLAY_NAME)]
    pub display_name: String,

    /// Optional engine description
    #[arg(long)]
    pub description: Option<String>,

    /// Interpreter version the runtime should provision
    #[arg(long)]
    pub runtime_version: Option<String>,

    /// Base requirements file [default: ./requirements.txt]
    #[arg(long)]
    pub requirements: Option<PathBuf>,

    /// Packaged agent bundle, shipped as an extra package
    #[arg(long, default_value = DEFAULT_BUNDLE)]
    pub bundle: PathBuf,
}

impl Cli {
    fn requirements_path(&self) -> Result<PathBuf, ClientError> {
        match &self.requirements {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir()
                .map(|dir| dir.join("requirements.txt"))
                .map_err(|source| ClientError::Io {
                    path: ".".into(),
                    source,
                }),
        }
    }

    /// Reads the requirements file and assembles the registration request.
    pub fn registration_request(&self) -> Result<RegistrationRequest, ClientError> {
        let base = load_requirements(&self.requirements_path()?)?;
        let mut agent = AgentDefinition::new(&self.display_name, &self.agent);
        if let Some(description) = &self.description {
            agent = agent.description(description);
        }
        if let Some(version) = &self.runtime_version {
            agent = agent.runtime_version(version);
        }
        Ok(RegistrationRequest::new(agent, base, &self.bundle))
    }
}
