//! Registering a locally built agent with the managed runtime.

mod http;
mod staging;

use std::path::PathBuf;

pub use self::http::HttpRegistrar;

use crate::errors::ClientError;
use crate::resource::ResourceName;

/// A locally built agent, ready to be shipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentDefinition {
    /// Name shown in the runtime console.
    pub display_name: String,
    pub description: Option<String>,
    /// Serialized agent object produced by the agent's packaging step.
    pub serialized_agent: PathBuf,
    /// Interpreter version the runtime should provision, when pinned.
    pub runtime_version: Option<String>,
}

impl AgentDefinition {
    pub fn new(display_name: impl Into<String>, serialized_agent: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            description: None,
            serialized_agent: serialized_agent.into(),
            runtime_version: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }
}

/// Everything the registration endpoint receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub agent: AgentDefinition,
    /// Base requirements followed by the bundle path.
    pub requirements: Vec<String>,
    pub extra_packages: Vec<PathBuf>,
}

impl RegistrationRequest {
    /// Appends `bundle` to the requirements as a pseudo-requirement and ships
    /// it as the only extra package.
    pub fn new(
        agent: AgentDefinition,
        base_requirements: Vec<String>,
        bundle: impl Into<PathBuf>,
    ) -> Self {
        let bundle = bundle.into();
        let mut requirements = base_requirements;
        requirements.push(bundle.display().to_string());
        Self {
            agent,
            requirements,
            extra_packages: vec![bundle],
        }
    }

    /// Requirements rendered as a requirements file body.
    pub fn requirements_file(&self) -> String {
        let mut body = self.requirements.join("\n");
        body.push('\n');
        body
    }
}

/// Handle to a freshly created engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    pub resource_name: ResourceName,
}

/// Registration endpoint contract.
#[async_trait::async_trait]
pub trait Registrar: Send + Sync {
    /// Creates an engine from `request`. Failures are returned unchanged.
    async fn create(&self, request: RegistrationRequest) -> Result<ResourceHandle, ClientError>;
}
