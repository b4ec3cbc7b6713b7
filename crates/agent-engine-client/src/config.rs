use std::time::Duration;

use crate::errors::ClientError;

const TOKEN_ENV_KEYS: [&str; 2] = ["AGENT_ENGINE_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];
const BASE_URL_ENV_KEY: &str = "AGENT_ENGINE_BASE_URL";

/// Configuration shared by the runtime client and the registrar.
#[derive(Clone, Debug)]
pub struct EngineClientConfig {
    /// Cloud project id.
    pub project: String,
    /// Region hosting the runtime (for example `us-central1`).
    pub location: String,
    /// Staging bucket, `gs://` form.
    pub staging_bucket: String,
    /// Bearer token for the ambient credentials.
    pub access_token: String,
    /// Overrides the regional API endpoint.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: Option<String>,
    /// Overrides the storage upload endpoint.
    pub storage_url: Option<String>,
    /// Default HTTP timeout for non-streaming requests.
    pub timeout: Duration,
}

impl EngineClientConfig {
    /// Creates a config with default timeouts and endpoints.
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        staging_bucket: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            staging_bucket: staging_bucket.into(),
            access_token: access_token.into(),
            base_url: None,
            storage_url: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Builds a config whose credentials come from the environment.
    ///
    /// The token is read from `AGENT_ENGINE_ACCESS_TOKEN`, falling back to
    /// `GOOGLE_OAUTH_ACCESS_TOKEN`. `AGENT_ENGINE_BASE_URL` optionally
    /// overrides the regional endpoint.
    pub fn from_env(
        project: impl Into<String>,
        location: impl Into<String>,
        staging_bucket: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let access_token = TOKEN_ENV_KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "missing access token (set {} or {})",
                    TOKEN_ENV_KEYS[0], TOKEN_ENV_KEYS[1]
                ))
            })?;
        let mut config = Self::new(project, location, staging_bucket, access_token.trim());
        if let Ok(base_url) = std::env::var(BASE_URL_ENV_KEY)
            && !base_url.trim().is_empty()
        {
            config.base_url = Some(base_url.trim().to_string());
        }
        config.validate()?;
        Ok(config)
    }

    /// Overrides the regional API endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the storage upload endpoint.
    pub fn storage_url(mut self, storage_url: impl Into<String>) -> Self {
        self.storage_url = Some(storage_url.into());
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the fields every request depends on.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.access_token.trim().is_empty() {
            return Err(ClientError::Config("access token must not be empty".into()));
        }
        if self.project.trim().is_empty() {
            return Err(ClientError::Config("project must not be empty".into()));
        }
        if self.location.trim().is_empty() {
            return Err(ClientError::Config("location must not be empty".into()));
        }
        if self.bucket_name().is_none() {
            return Err(ClientError::Config(format!(
                "staging bucket must look like gs://<name>, got {:?}",
                self.staging_bucket
            )));
        }
        Ok(())
    }

    /// Bucket name without the `gs://` scheme or trailing slash.
    pub fn bucket_name(&self) -> Option<&str> {
        self.staging_bucket
            .strip_prefix("gs://")
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|name| !name.is_empty() && !name.contains('/'))
    }

    pub(crate) fn api_base(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }

    pub(crate) fn resource_url(&self, resource: &str) -> String {
        format!("{}/v1/{}", self.api_base(), resource)
    }

    pub(crate) fn storage_upload_base(&self) -> String {
        match &self.storage_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => "https://storage.googleapis.com".to_string(),
        }
    }
}
