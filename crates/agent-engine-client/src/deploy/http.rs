use std::time::Duration;

use tracing::{debug, info};

use super::staging::{Stager, build_dependency_archive};
use super::{RegistrationRequest, Registrar, ResourceHandle};
use crate::config::EngineClientConfig;
use crate::errors::{ClientError, RemoteError, service_error_from_response};
use crate::resource::ResourceName;

const STAGING_ROOT: &str = "agent_engine";
const AGENT_OBJECT: &str = "agent_engine.pkl";
const REQUIREMENTS_OBJECT: &str = "requirements.txt";
const DEPENDENCIES_OBJECT: &str = "dependencies.tar.gz";

/// REST binding of [`Registrar`]: stages artifacts in Cloud Storage, creates
/// the engine, then waits on the returned long-running operation.
pub struct HttpRegistrar {
    client: reqwest::Client,
    config: EngineClientConfig,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl HttpRegistrar {
    pub fn new(config: EngineClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(config, client)
    }

    pub(crate) fn with_client(
        config: EngineClientConfig,
        client: reqwest::Client,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            poll_interval: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30 * 60),
        })
    }

    /// How often the create operation is polled.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Upper bound on waiting for the create operation.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    async fn get_json(&self, url: String, what: &str) -> Result<serde_json::Value, RemoteError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .timeout(self.config.timeout)
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

    async fn wait_for_operation(
        &self,
        mut operation: serde_json::Value,
    ) -> Result<ResourceName, RemoteError> {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(name) = resource_from_operation(&operation)? {
                return Ok(name);
            }
            if started.elapsed() >= self.operation_timeout {
                return Err(RemoteError::transport(format!(
                    "create operation did not finish within {:?}",
                    self.operation_timeout
                )));
            }
            let op_name = operation
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| RemoteError::protocol("create operation has no name"))?
                .to_string();
            tokio::time::sleep(self.poll_interval).await;
            debug!(operation = %op_name, "polling create operation");
            operation = self
                .get_json(self.config.resource_url(&op_name), "operation poll")
                .await?;
        }
    }
}

#[async_trait::async_trait]
impl Registrar for HttpRegistrar {
    async fn create(&self, request: RegistrationRequest) -> Result<ResourceHandle, ClientError> {
        let agent_path = &request.agent.serialized_agent;
        let agent_bytes = tokio::fs::read(agent_path)
            .await
            .map_err(|e| ClientError::io(agent_path, e))?;
        let packages = request.extra_packages.clone();
        let dependencies =
            tokio::task::spawn_blocking(move || build_dependency_archive(&packages))
                .await
                .map_err(|e| ClientError::io(DEPENDENCIES_OBJECT, std::io::Error::other(e)))??;

        let prefix = format!("{STAGING_ROOT}/{}", uuid::Uuid::new_v4());
        let stager = Stager::new(&self.client, &self.config, prefix)?;
        let agent_uri = stager.upload(AGENT_OBJECT, agent_bytes).await?;
        let requirements_uri = stager
            .upload(REQUIREMENTS_OBJECT, request.requirements_file().into_bytes())
            .await?;
        let dependencies_uri = stager.upload(DEPENDENCIES_OBJECT, dependencies).await?;
        info!(agent = %agent_uri, "staged agent artifacts");

        let body = create_engine_body(&request, &agent_uri, &requirements_uri, &dependencies_uri);
        let url = self.config.resource_url(&ResourceName::collection(
            &self.config.project,
            &self.config.location,
        ));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.access_token)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("create engine request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(service_error_from_response("create engine", response)
                .await
                .into());
        }
        let operation: serde_json::Value = response.json().await.map_err(|e| {
            RemoteError::protocol(format!("create engine returned invalid JSON: {e}"))
        })?;
        debug!(operation = ?operation.get("name"), "create engine accepted");

        let resource_name = self.wait_for_operation(operation).await?;
        Ok(ResourceHandle { resource_name })
    }
}

pub(crate) fn create_engine_body(
    request: &RegistrationRequest,
    agent_uri: &str,
    requirements_uri: &str,
    dependencies_uri: &str,
) -> serde_json::Value {
    let mut package_spec = serde_json::json!({
        "pickleObjectGcsUri": agent_uri,
        "requirementsGcsUri": requirements_uri,
        "dependencyFilesGcsUri": dependencies_uri,
    });
    if let Some(version) = &request.agent.runtime_version {
        package_spec["pythonVersion"] = serde_json::json!(version);
    }
    let mut body = serde_json::json!({
        "displayName": request.agent.display_name,
        "spec": { "packageSpec": package_spec },
    });
    if let Some(description) = &request.agent.description {
        body["description"] = serde_json::json!(description);
    }
    body
}

/// `Some` once the operation is done, an error if it failed.
pub(crate) fn resource_from_operation(
    operation: &serde_json::Value,
) -> Result<Option<ResourceName>, RemoteError> {
    if !operation
        .get("done")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        return Ok(None);
    }
    if let Some(error) = operation.get("error") {
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("create operation failed");
        return Err(RemoteError::service(message, None));
    }
    let name = operation
        .get("response")
        .and_then(|r| r.get("name"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| RemoteError::protocol("finished create operation has no resource name"))?;
    name.parse::<ResourceName>()
        .map(Some)
        .map_err(|e| RemoteError::protocol(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::AgentDefinition;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::{TcpListener, TcpStream};

    const OPERATION: &str = "projects/p/locations/us-central1/reasoningEngines/1/operations/9";
    const ENGINE: &str = "projects/p/locations/us-central1/reasoningEngines/1";

    /// Local stand-in for the storage and engine endpoints. Each request is
    /// recorded as `METHOD target`; creates return a pending operation and
    /// polls return it finished.
    async fn fake_api() -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let target = read_request(&mut socket).await;
                let body = canned_response(&target);
                seen.lock().expect("lock").push(target);
                let reply = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (base, log)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.expect("read");
            assert!(n > 0, "connection closed before request head");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.expect("read body");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let mut request_line = head.split_whitespace();
        let method = request_line.next().unwrap_or_default();
        let target = request_line.next().unwrap_or_default();
        format!("{method} {target}")
    }

    fn canned_response(target: &str) -> String {
        if target.starts_with("POST /v1/") {
            serde_json::json!({"name": OPERATION}).to_string()
        } else if target.starts_with("GET /v1/") {
            serde_json::json!({"name": OPERATION, "done": true, "response": {"name": ENGINE}})
                .to_string()
        } else {
            "{}".to_string()
        }
    }

    fn registration(dir: &Path) -> RegistrationRequest {
        let agent = dir.join("agent.pkl");
        std::fs::write(&agent, b"pickled-agent").expect("write agent");
        let bundle = dir.join("pkg.whl");
        std::fs::write(&bundle, b"wheel").expect("write bundle");
        RegistrationRequest::new(
            AgentDefinition::new("image_scoring", agent),
            vec!["google-adk".into()],
            bundle,
        )
    }

    fn registrar(base: &str) -> HttpRegistrar {
        let config = EngineClientConfig::new("p", "us-central1", "gs://bucket", "token")
            .base_url(base)
            .storage_url(base);
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client");
        HttpRegistrar::with_client(config, client)
            .expect("registrar")
            .poll_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn create_stages_artifacts_then_creates_then_polls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (base, log) = fake_api().await;

        let handle = registrar(&base)
            .create(registration(dir.path()))
            .await
            .expect("create");

        assert_eq!(handle.resource_name.to_string(), ENGINE);
        let log = log.lock().expect("lock").clone();
        assert_eq!(log.len(), 5, "{log:?}");
        for (entry, object) in log.iter().zip([AGENT_OBJECT, REQUIREMENTS_OBJECT, DEPENDENCIES_OBJECT]) {
            assert!(entry.starts_with("POST /upload/storage/v1/b/bucket/o?"), "{entry}");
            assert!(entry.contains(object), "{entry}");
        }
        assert_eq!(log[3], "POST /v1/projects/p/locations/us-central1/reasoningEngines");
        assert_eq!(log[4], format!("GET /v1/{OPERATION}"));
    }

    #[tokio::test]
    async fn unfinished_operation_times_out_without_polling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (base, log) = fake_api().await;

        let err = registrar(&base)
            .operation_timeout(Duration::ZERO)
            .create(registration(dir.path()))
            .await
            .expect_err("should time out");

        assert!(matches!(
            err,
            ClientError::Remote(RemoteError::Transport { .. })
        ));
        let log = log.lock().expect("lock").clone();
        assert_eq!(log.len(), 4, "{log:?}");
        assert!(log.iter().all(|entry| !entry.starts_with("GET ")));
    }

    #[tokio::test]
    async fn missing_agent_file_fails_before_staging() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (base, log) = fake_api().await;
        let mut request = registration(dir.path());
        request.agent.serialized_agent = dir.path().join("absent.pkl");

        let err = registrar(&base).create(request).await.expect_err("should fail");

        assert!(matches!(err, ClientError::Io { .. }));
        assert!(log.lock().expect("lock").is_empty());
    }

    #[test]
    fn pending_operation_is_not_finished() {
        let op = serde_json::json!({"name": "projects/p/locations/l/reasoningEngines/1/operations/9"});
        assert_eq!(resource_from_operation(&op).expect("ok"), None);
    }

    #[test]
    fn finished_operation_yields_resource_name() {
        let op = serde_json::json!({
            "name": "projects/p/locations/l/reasoningEngines/1/operations/9",
            "done": true,
            "response": {"name": "projects/p/locations/l/reasoningEngines/1"}
        });
        let name = resource_from_operation(&op).expect("ok").expect("done");
        assert_eq!(name.engine_id(), "1");
    }

    #[test]
    fn failed_operation_is_service_error() {
        let op = serde_json::json!({"done": true, "error": {"code": 3, "message": "bad pickle"}});
        assert_eq!(
            resource_from_operation(&op),
            Err(RemoteError::service("bad pickle", None))
        );
    }

    #[test]
    fn create_body_points_at_staged_objects() {
        let request = RegistrationRequest::new(
            AgentDefinition::new("image_scoring", "agent.pkl").runtime_version("3.12"),
            vec![],
            "dist/pkg.whl",
        );
        let body = create_engine_body(&request, "gs://b/a", "gs://b/r", "gs://b/d");
        assert_eq!(
            body.get("displayName").and_then(|v| v.as_str()),
            Some("image_scoring")
        );
        let spec = &body["spec"]["packageSpec"];
        assert_eq!(spec["pickleObjectGcsUri"], "gs://b/a");
        assert_eq!(spec["requirementsGcsUri"], "gs://b/r");
        assert_eq!(spec["dependencyFilesGcsUri"], "gs://b/d");
        assert_eq!(spec["pythonVersion"], "3.12");
        assert!(body.get("description").is_none());
    }
}
