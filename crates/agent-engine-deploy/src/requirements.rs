use std::path::Path;

use agent_engine_client::ClientError;

/// Reads a requirements file one entry per line, as written.
pub fn load_requirements(path: &Path) -> Result<Vec<String>, ClientError> {
    let body = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(body.lines().map(ToOwned::to_owned).collect())
}
