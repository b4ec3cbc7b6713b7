//! Common imports for typical client usage.
pub use crate::{
    AgentDefinition, AgentEngines, AgentRuntime, ClientError, EngineClientConfig, Event,
    EventStream, RegistrationRequest, Registrar, RemoteAgent, RemoteError, RemoteSession,
    ResourceHandle, ResourceName, UserId,
};
