//! Folds a remote agent's event stream into a [`Summary`].
//!
//! Every check runs against every event, in a fixed order. Malformed or
//! partial events only ever degrade to "field absent".

use std::collections::HashSet;

use agent_engine_client::{Event, RemoteError, ScoreValue};
use futures::{Stream, StreamExt as _};
use serde_json::Value;
use tracing::debug;

use crate::summary::Summary;

const GENERATE_IMAGES_TOOL: &str = "generate_images";
const SET_SCORE_TOOL: &str = "set_score";
const SCORE_KEY: &str = "total_score";
const ARTIFACT_NAME_KEY: &str = "artifact_name";
/// Checked in this order; first non-empty wins.
const GCS_URI_KEYS: [&str; 2] = ["generated_image_gcs_uri", "image_uri"];

/// Incremental reducer state.
#[derive(Debug, Default)]
pub struct SummaryBuilder {
    total_score: Option<i64>,
    artifacts: Vec<String>,
    gcs_uri: Option<String>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event.
    pub fn observe(&mut self, event: &Event) {
        self.capture_generated_image(event);
        self.capture_artifact_delta(event);
        self.capture_set_score(event);
        self.capture_state_delta(event);
    }

    /// De-duplicates artifacts (first occurrence wins) and freezes the result.
    pub fn finish(self) -> Summary {
        let mut seen = HashSet::new();
        let artifacts = self
            .artifacts
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Summary {
            total_score: self.total_score,
            artifacts,
            gcs_uri: self.gcs_uri,
        }
    }

    fn capture_generated_image(&mut self, event: &Event) {
        if event.function_response_name() != Some(GENERATE_IMAGES_TOOL) {
            return;
        }
        if let Some(name) = event
            .function_response()
            .and_then(|response| non_empty_str(response.get(ARTIFACT_NAME_KEY)))
        {
            self.artifacts.push(name.to_string());
        }
    }

    fn capture_artifact_delta(&mut self, event: &Event) {
        if let Some(delta) = event.artifact_delta() {
            self.artifacts.extend(delta.keys().cloned());
        }
    }

    fn capture_set_score(&mut self, event: &Event) {
        if event.function_call_name() != Some(SET_SCORE_TOOL) {
            return;
        }
        if let Some(candidate) = event.function_call_args().and_then(|args| args.get(SCORE_KEY)) {
            self.apply_score(candidate, "set_score args");
        }
    }

    fn capture_state_delta(&mut self, event: &Event) {
        let Some(delta) = event.state_delta().filter(|delta| !delta.is_empty()) else {
            return;
        };
        if let Some(candidate) = delta.get(SCORE_KEY) {
            self.apply_score(candidate, "state_delta");
        }
        if self.gcs_uri.is_none() {
            self.gcs_uri = GCS_URI_KEYS
                .iter()
                .find_map(|key| non_empty_str(delta.get(*key)))
                .map(ToOwned::to_owned);
        }
    }

    fn apply_score(&mut self, candidate: &Value, source: &'static str) {
        match ScoreValue::decode(candidate) {
            ScoreValue::Integer(score) => self.total_score = Some(score),
            ScoreValue::Rejected(reason) => {
                debug!(source, ?reason, value = %candidate, "ignoring non-integer score");
            }
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Consumes `events` to completion and returns the final summary.
///
/// The first stream error is returned as-is and no summary is produced.
pub async fn reduce_stream<S>(events: S) -> Result<Summary, RemoteError>
where
    S: Stream<Item = Result<Event, RemoteError>>,
{
    reduce_stream_inspect(events, |_| {}).await
}

/// [`reduce_stream`] with a hook that sees each event before it is applied.
pub async fn reduce_stream_inspect<S, F>(events: S, mut inspect: F) -> Result<Summary, RemoteError>
where
    S: Stream<Item = Result<Event, RemoteError>>,
    F: FnMut(&Event),
{
    let mut events = std::pin::pin!(events);
    let mut builder = SummaryBuilder::new();
    while let Some(event) = events.next().await {
        let event = event?;
        inspect(&event);
        builder.observe(&event);
    }
    Ok(builder.finish())
}
