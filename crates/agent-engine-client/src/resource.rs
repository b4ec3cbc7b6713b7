use std::fmt;
use std::str::FromStr;

use crate::errors::ClientError;

const ENGINE_COLLECTION: &str = "reasoningEngines";

/// Fully-qualified engine path:
/// `projects/{project}/locations/{location}/reasoningEngines/{id}`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName {
    project: String,
    location: String,
    engine_id: String,
}

impl ResourceName {
    /// Builds a resource name from its parts.
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let name = Self {
            project: project.into(),
            location: location.into(),
            engine_id: engine_id.into(),
        };
        for (label, part) in [
            ("project", &name.project),
            ("location", &name.location),
            ("engine id", &name.engine_id),
        ] {
            if part.trim().is_empty() || part.contains('/') {
                return Err(ClientError::Validation(format!(
                    "invalid {label} segment in resource name: {part:?}"
                )));
            }
        }
        Ok(name)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    /// Parent collection path used by create calls.
    pub fn collection(project: &str, location: &str) -> String {
        format!("projects/{project}/locations/{location}/{ENGINE_COLLECTION}")
    }
}

impl FromStr for ResourceName {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = value.trim().trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["projects", project, "locations", location, ENGINE_COLLECTION, engine_id] => {
                Self::new(*project, *location, *engine_id)
            }
            _ => Err(ClientError::Validation(format!(
                "expected projects/<project>/locations/<location>/{ENGINE_COLLECTION}/<id>, got {value:?}"
            ))),
        }
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceName> for String {
    fn from(value: ResourceName) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            Self::collection(&self.project, &self.location),
            self.engine_id
        )
    }
}
