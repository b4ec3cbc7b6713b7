use std::pin::Pin;

use crate::errors::RemoteError;
use crate::event::Event;
use crate::resource::ResourceName;
use crate::session::{RemoteSession, UserId};

/// Ordered, single-pass sequence of events from one streaming query.
pub type EventStream = Pin<Box<dyn futures::Stream<Item = Result<Event, RemoteError>> + Send>>;

/// Metadata returned when an engine is looked up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineInfo {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub create_time: Option<String>,
}

/// Contract the managed runtime has to honor.
///
/// `HttpAgentRuntime` is the production binding; tests swap in fakes.
#[async_trait::async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Looks up a deployed engine by resource name.
    async fn get_engine(&self, resource: &ResourceName) -> Result<EngineInfo, RemoteError>;

    /// Creates a remote session scoped to `user_id`.
    async fn create_session(
        &self,
        resource: &ResourceName,
        user_id: &UserId,
    ) -> Result<RemoteSession, RemoteError>;

    /// Sends a single message and returns the event stream it produces.
    async fn stream_query(
        &self,
        resource: &ResourceName,
        user_id: &UserId,
        session_id: &str,
        message: &str,
    ) -> Result<EventStream, RemoteError>;
}
