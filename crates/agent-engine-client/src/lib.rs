//! Typed client for managed Agent Engine runtimes.
//!
//! Covers the two calls an operator makes against the runtime: registering a
//! locally built agent, and streaming a query against a deployed one.
//!
//! # Streaming a query
//!
//! ```no_run
//! use agent_engine_client::prelude::*;
//! use futures::StreamExt as _;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let config = EngineClientConfig::from_env("my-project", "us-central1", "gs://my-bucket")?;
//! let engines = AgentEngines::from_config(config)?;
//!
//! let resource: ResourceName =
//!     "projects/123/locations/us-central1/reasoningEngines/456".parse()?;
//! let agent = engines.get(&resource).await?;
//! let user = UserId::new("u_456");
//! let session = agent.create_session(&user).await?;
//!
//! let mut events = agent.stream_query(&user, &session.id, "A cat riding a bicycle").await?;
//! while let Some(event) = events.next().await {
//!     println!("{}", event?.kind());
//! }
//! # Ok(())
//! # }
//! ```

/// Engine lookup entry point and remote agent handle.
pub mod agent;
/// Endpoint, credential and timeout configuration.
pub mod config;
/// Registration of locally built agents.
pub mod deploy;
/// Public error types.
pub mod errors;
/// Event trees, nested lookup and strict score decoding.
pub mod event;
/// REST binding of the runtime contract.
pub mod http;
/// Process-wide logging setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Engine resource names.
pub mod resource;
/// Runtime contract implemented by the REST binding and by test fakes.
pub mod runtime;
/// Session handle and user identity.
pub mod session;
mod transport;

pub use agent::{AgentEngines, RemoteAgent};
pub use config::EngineClientConfig;
pub use deploy::{
    AgentDefinition, HttpRegistrar, RegistrationRequest, Registrar, ResourceHandle,
};
pub use errors::{ClientError, RemoteError};
pub use event::{Event, ScoreRejection, ScoreValue, lookup, safe_path_get};
pub use http::HttpAgentRuntime;
pub use observability::init_observability;
pub use resource::ResourceName;
pub use runtime::{AgentRuntime, EngineInfo, EventStream};
pub use session::{RemoteSession, UserId};
