use std::io::Write;

use agent_engine_client::{AgentEngines, ClientError, ResourceName, UserId};
use tracing::{debug, info};

use crate::reducer::reduce_stream_inspect;
use crate::summary::Summary;

/// Where a run is in its lifecycle.
///
/// `Streaming` is the only state that loops. Any error moves straight to
/// `Error`; a run never reaches `Finalized` after that.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Init,
    SessionCreated,
    Streaming,
    Finalized,
    Error,
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Inputs for a single prompt exchange.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub engine: ResourceName,
    pub user_id: UserId,
    pub prompt: String,
    /// Log a compact kind tag for every event.
    pub verbose_events: bool,
}

/// One streamed exchange against a deployed agent.
pub struct Run<'a> {
    engines: &'a AgentEngines,
    request: RunRequest,
    state: RunState,
}

impl<'a> Run<'a> {
    pub fn new(engines: &'a AgentEngines, request: RunRequest) -> Self {
        Self {
            engines,
            request,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Looks up the agent, opens a session, streams the prompt and writes the
    /// summary to `out`. Nothing is summarized if any step fails.
    pub async fn execute<W: Write>(&mut self, out: &mut W) -> Result<Summary, RunError> {
        match self.drive(out).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                self.transition(RunState::Error);
                Err(err)
            }
        }
    }

    async fn drive<W: Write>(&mut self, out: &mut W) -> Result<Summary, RunError> {
        let agent = self.engines.get(&self.request.engine).await?;
        writeln!(out, "{agent}\nresource name: {}", agent.resource_name())?;

        let session = agent.create_session(&self.request.user_id).await?;
        info!("Created session id: {}", session.id);
        self.transition(RunState::SessionCreated);

        let events = agent
            .stream_query(&self.request.user_id, &session.id, &self.request.prompt)
            .await?;
        self.transition(RunState::Streaming);

        let verbose = self.request.verbose_events;
        let summary = reduce_stream_inspect(events, |event| {
            if verbose {
                info!("Event kind: {}", event.kind());
            }
        })
        .await
        .map_err(ClientError::from)?;
        self.transition(RunState::Finalized);

        write!(out, "{}", summary.render(&self.request.prompt))?;
        Ok(summary)
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }
}
