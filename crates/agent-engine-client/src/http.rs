use tracing::debug;

use crate::config::EngineClientConfig;
use crate::errors::{ClientError, RemoteError, service_error_from_response};
use crate::resource::ResourceName;
use crate::runtime::{AgentRuntime, EngineInfo, EventStream};
use crate::session::{RemoteSession, UserId};
use crate::transport::{ByteStream, event_stream};

const CREATE_SESSION_METHOD: &str = "async_create_session";
const STREAM_QUERY_METHOD: &str = "async_stream_query";

/// REST binding of [`AgentRuntime`] against the regional Agent Engine API.
pub struct HttpAgentRuntime {
    client: reqwest::Client,
    config: EngineClientConfig,
}

impl HttpAgentRuntime {
    /// Creates a runtime client from explicit configuration.
    pub fn new(config: EngineClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        // No client-wide timeout: it would cut long streams short. Unary
        // calls set their own.
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EngineClientConfig {
        &self.config
    }

    async fn post_json(
        &self,
        url: String,
        body: &serde_json::Value,
        what: &str,
    ) -> Result<serde_json::Value, RemoteError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.access_token)
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("{what} request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(service_error_from_response(what, response).await);
        }
        response
            .json()
            .await
            .map_err(|e| RemoteError::protocol(format!("{what} returned invalid JSON: {e}")))
    }
}

#[async_trait::async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn get_engine(&self, resource: &ResourceName) -> Result<EngineInfo, RemoteError> {
        debug!(resource = %resource, "looking up engine");
        let response = self
            .client
            .get(self.config.resource_url(&resource.to_string()))
            .bearer_auth(&self.config.access_token)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("engine lookup request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(service_error_from_response("engine lookup", response).await);
        }
        let body: serde_json::Value = response.json().await.map_err(|e| {
            RemoteError::protocol(format!("engine lookup returned invalid JSON: {e}"))
        })?;
        Ok(engine_info_from_json(&body))
    }

    async fn create_session(
        &self,
        resource: &ResourceName,
        user_id: &UserId,
    ) -> Result<RemoteSession, RemoteError> {
        let url = format!("{}:query", self.config.resource_url(&resource.to_string()));
        let body = create_session_body(user_id);
        debug!(resource = %resource, user_id = %user_id, "creating remote session");
        let response = self.post_json(url, &body, "create session").await?;
        session_from_query_output(&response)
    }

    async fn stream_query(
        &self,
        resource: &ResourceName,
        user_id: &UserId,
        session_id: &str,
        message: &str,
    ) -> Result<EventStream, RemoteError> {
        let url = format!(
            "{}:streamQuery",
            self.config.resource_url(&resource.to_string())
        );
        let body = stream_query_body(user_id, session_id, message);
        debug!(resource = %resource, session_id, "starting streaming query");

        let response = self
            .client
            .post(url)
            .query(&[("alt", "sse")])
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("stream query request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(service_error_from_response("stream query", response).await);
        }

        let bytes_stream: ByteStream = Box::pin(response.bytes_stream());
        Ok(Box::pin(event_stream(bytes_stream)))
    }
}

pub(crate) fn create_session_body(user_id: &UserId) -> serde_json::Value {
    serde_json::json!({
        "class_method": CREATE_SESSION_METHOD,
        "input": { "user_id": user_id.as_str() },
    })
}

pub(crate) fn stream_query_body(
    user_id: &UserId,
    session_id: &str,
    message: &str,
) -> serde_json::Value {
    serde_json::json!({
        "class_method": STREAM_QUERY_METHOD,
        "input": {
            "user_id": user_id.as_str(),
            "session_id": session_id,
            "message": message,
        },
    })
}

pub(crate) fn session_from_query_output(
    response: &serde_json::Value,
) -> Result<RemoteSession, RemoteError> {
    let output = response.get("output").unwrap_or(response);
    serde_json::from_value(output.clone())
        .map_err(|e| RemoteError::protocol(format!("create session output has no usable id: {e}")))
}

fn engine_info_from_json(body: &serde_json::Value) -> EngineInfo {
    let text = |key: &str| body.get(key).and_then(|v| v.as_str()).map(ToOwned::to_owned);
    EngineInfo {
        display_name: text("displayName"),
        description: text("description"),
        create_time: text("createTime"),
    }
}
