use agent_engine_client::{ResourceName, UserId};
use clap::Parser;

use crate::run::RunRequest;

pub const DEFAULT_PROJECT: &str = "the-byway-473000-u5";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_BUCKET: &str = "gs://next-demo-storage1-us-central1";
pub const DEFAULT_ENGINE: &str =
    "projects/736220893495/locations/us-central1/reasoningEngines/4079051799607115776";
pub const DEFAULT_PROMPT: &str = "A cat riding a bicycle";
pub const DEFAULT_USER_ID: &str = "u_456";

/// Stream one prompt against a deployed agent and print a score summary.
#[derive(Debug, Parser)]
#[command(name = "remote-test", version)]
pub struct Cli {
    /// Cloud project id
    #[arg(long, env = "AGENT_ENGINE_PROJECT", default_value = DEFAULT_PROJECT)]
    pub project: String,

    /// Region hosting the engine
    #[arg(long, env = "AGENT_ENGINE_LOCATION", default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// Staging bucket (gs://...)
    #[arg(long, env = "AGENT_ENGINE_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Fully-qualified engine resource name
    #[arg(long, env = "AGENT_ENGINE_RESOURCE", default_value = DEFAULT_ENGINE)]
    pub engine: ResourceName,

    /// Prompt sent to the agent
    #[arg(long, default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// User identity the remote session is scoped to
    #[arg(long, env = "AGENT_ENGINE_USER_ID", default_value = DEFAULT_USER_ID)]
    pub user_id: String,

    /// Log compact event kinds during the stream
    #[arg(long)]
    pub verbose_events: bool,
}

impl Cli {
    pub fn run_request(&self) -> RunRequest {
        RunRequest {
            engine: self.engine.clone(),
            user_id: UserId::new(self.user_id.clone()),
            prompt: self.prompt.clone(),
            verbose_events: self.verbose_events,
        }
    }
}
