use std::io::Write as _;
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::config::EngineClientConfig;
use crate::errors::{ClientError, RemoteError, service_error_from_response};

/// Uploads staged objects into the configured bucket.
pub(crate) struct Stager<'a> {
    client: &'a reqwest::Client,
    config: &'a EngineClientConfig,
    bucket: &'a str,
    prefix: String,
}

impl<'a> Stager<'a> {
    pub fn new(
        client: &'a reqwest::Client,
        config: &'a EngineClientConfig,
        prefix: String,
    ) -> Result<Self, ClientError> {
        let bucket = config.bucket_name().ok_or_else(|| {
            ClientError::Config(format!("invalid staging bucket {:?}", config.staging_bucket))
        })?;
        Ok(Self {
            client,
            config,
            bucket,
            prefix,
        })
    }

    /// Uploads `bytes` as `<prefix>/<name>` and returns its `gs://` URI.
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, RemoteError> {
        let object = format!("{}/{}", self.prefix, name);
        let url = format!(
            "{}/upload/storage/v1/b/{}/o",
            self.config.storage_upload_base(),
            self.bucket
        );
        debug!(bucket = self.bucket, object = %object, size = bytes.len(), "staging object");
        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", object.as_str())])
            .bearer_auth(&self.config.access_token)
            .timeout(self.config.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("staging upload failed: {e}")))?;
        if !response.status().is_success() {
            return Err(service_error_from_response("staging upload", response).await);
        }
        Ok(format!("gs://{}/{}", self.bucket, object))
    }
}

/// Name a package gets inside the dependency archive.
///
/// Relative paths keep their directories (minus `./`) so requirement lines
/// that point at them still resolve after extraction.
pub(crate) fn archive_name(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return path.file_name().map(PathBuf::from);
    }
    let name: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    if name.as_os_str().is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Packs `packages` into a gzip tarball held in memory.
pub(crate) fn build_dependency_archive(packages: &[PathBuf]) -> Result<Vec<u8>, ClientError> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);
    for package in packages {
        let name = archive_name(package).ok_or_else(|| {
            ClientError::Validation(format!(
                "extra package path has no file name: {}",
                package.display()
            ))
        })?;
        if package.is_dir() {
            archive
                .append_dir_all(&name, package)
                .map_err(|e| ClientError::io(package, e))?;
        } else {
            archive
                .append_path_with_name(package, &name)
                .map_err(|e| ClientError::io(package, e))?;
        }
    }
    let mut encoder = archive
        .into_inner()
        .map_err(|e| ClientError::io("dependencies.tar.gz", e))?;
    encoder
        .flush()
        .map_err(|e| ClientError::io("dependencies.tar.gz", e))?;
    encoder
        .finish()
        .map_err(|e| ClientError::io("dependencies.tar.gz", e))
}
