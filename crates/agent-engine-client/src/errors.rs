/// Errors returned by the managed runtime (or the wire between us and it).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Service returned an application-level failure (HTTP status, auth, quota, not-found).
    #[error("service error: {message}")]
    Service {
        message: String,
        status_code: Option<u16>,
    },
    /// Transport or stream I/O failed.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Response shape was not what the runtime contract promises.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl RemoteError {
    /// Creates a service-level error.
    pub fn service(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Service {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// HTTP status attached to a service error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Service { status_code, .. } => *status_code,
            Self::Transport { .. } | Self::Protocol { .. } => None,
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Service { message, .. }
            | Self::Transport { message }
            | Self::Protocol { message } => message,
        }
    }
}

/// Top-level error type for the public client API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration (missing token, bad bucket, ...).
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input (empty prompt, malformed resource name, ...).
    #[error("validation error: {0}")]
    Validation(String),
    /// Failure reported by the remote runtime.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// Local file access failed.
    #[error("io error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub(crate) async fn service_error_from_response(
    what: &str,
    response: reqwest::Response,
) -> RemoteError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    RemoteError::service(
        format!("{what} failed with status {status}: {body}"),
        Some(status.as_u16()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_on_service_errors() {
        assert_eq!(
            RemoteError::service("not found", Some(404)).status_code(),
            Some(404)
        );
        assert_eq!(RemoteError::transport("reset").status_code(), None);
    }

    #[test]
    fn remote_errors_are_transparent_in_client_errors() {
        let err = ClientError::from(RemoteError::protocol("missing id"));
        assert_eq!(err.to_string(), "protocol error: missing id");
    }
}
