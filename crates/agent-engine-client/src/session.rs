use std::fmt;

/// User identity a remote session is scoped to.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Session handle returned by the runtime.
///
/// Only `id` is relied upon; the rest of the payload is kept for logging.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RemoteSession {
    pub id: String,
    #[serde(default, rename = "userId", alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(default, rename = "appName", alias = "app_name")]
    pub app_name: Option<String>,
    #[serde(default)]
    pub state: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_session_accepts_both_key_casings() {
        let snake: RemoteSession =
            serde_json::from_value(serde_json::json!({"id": "s1", "user_id": "u_456"}))
                .expect("snake");
        let camel: RemoteSession =
            serde_json::from_value(serde_json::json!({"id": "s1", "userId": "u_456"}))
                .expect("camel");
        assert_eq!(snake, camel);
        assert!(snake.state.is_empty());
    }

    #[test]
    fn remote_session_requires_id() {
        let result: Result<RemoteSession, _> =
            serde_json::from_value(serde_json::json!({"userId": "u"}));
        assert!(result.is_err());
    }
}
