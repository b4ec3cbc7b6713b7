use std::fmt;
use std::sync::Arc;

use crate::config::EngineClientConfig;
use crate::errors::ClientError;
use crate::http::HttpAgentRuntime;
use crate::resource::ResourceName;
use crate::runtime::{AgentRuntime, EngineInfo, EventStream};
use crate::session::{RemoteSession, UserId};

/// Entry point for looking up deployed engines.
#[derive(Clone)]
pub struct AgentEngines {
    runtime: Arc<dyn AgentRuntime>,
}

impl AgentEngines {
    /// Wraps any runtime binding.
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self { runtime }
    }

    /// Uses the REST binding for `config`.
    pub fn from_config(config: EngineClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(HttpAgentRuntime::new(config)?)))
    }

    /// Looks up a deployed engine and returns a handle to it.
    pub async fn get(&self, resource: &ResourceName) -> Result<RemoteAgent, ClientError> {
        let info = self.runtime.get_engine(resource).await?;
        Ok(RemoteAgent {
            runtime: self.runtime.clone(),
            resource: resource.clone(),
            info,
        })
    }
}

/// Handle to one deployed engine.
#[derive(Clone)]
pub struct RemoteAgent {
    runtime: Arc<dyn AgentRuntime>,
    resource: ResourceName,
    info: EngineInfo,
}

impl RemoteAgent {
    pub fn resource_name(&self) -> &ResourceName {
        &self.resource
    }

    pub fn info(&self) -> &EngineInfo {
        &self.info
    }

    /// Creates a remote session for `user_id`. Required before streaming.
    pub async fn create_session(&self, user_id: &UserId) -> Result<RemoteSession, ClientError> {
        if user_id.as_str().trim().is_empty() {
            return Err(ClientError::Validation("user id must not be empty".into()));
        }
        Ok(self.runtime.create_session(&self.resource, user_id).await?)
    }

    /// Sends `message` within an existing session and returns its events.
    pub async fn stream_query(
        &self,
        user_id: &UserId,
        session_id: &str,
        message: &str,
    ) -> Result<EventStream, ClientError> {
        if session_id.trim().is_empty() {
            return Err(ClientError::Validation("session id must not be empty".into()));
        }
        if message.trim().is_empty() {
            return Err(ClientError::Validation("message must not be empty".into()));
        }
        Ok(self
            .runtime
            .stream_query(&self.resource, user_id, session_id, message)
            .await?)
    }
}

impl fmt::Display for RemoteAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info.display_name {
            Some(name) => write!(f, "RemoteAgent({name})"),
            None => write!(f, "RemoteAgent({})", self.resource.engine_id()),
        }
    }
}
