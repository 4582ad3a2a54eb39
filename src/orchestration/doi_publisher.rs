//! DOI Publisher - orchestrator for the deposition workflow
//!
//! Manages the three-step sequence against the deposition API:
//! - Draft creation followed by a metadata update
//! - File attachment, one multipart upload per file
//! - Publishing, which binds the DOI to the record
//!
//! Each step assumes the previous one succeeded. Nothing is rolled back: a
//! failure partway leaves the draft (and any attached files) on the remote
//! service.

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::metadata::RecordMetadata;
use crate::core::traits::{
    ApiRequest, ApiResponse, DepositFile, DepositTransport, HttpMethod, PublishResult, RecordId,
    RequestBody,
};
use crate::transport::http::HttpTransport;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tokio::fs;

/// Multipart field name the upload endpoint expects
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
struct CreatedDeposition {
    id: RecordId,
}

#[derive(Debug, Default, Deserialize)]
struct DepositionLinks {
    doi: Option<String>,
}

/// Publish response: only the DOI fields are typed strictly
///
/// The echoed id, creation time and metadata are informational. A value of an
/// unexpected shape is dropped instead of failing a publish that already
/// happened on the remote side.
#[derive(Debug, Deserialize)]
struct PublishedDeposition {
    doi: Option<String>,
    #[serde(default)]
    links: DepositionLinks,
    id: Option<serde_json::Value>,
    created: Option<serde_json::Value>,
    metadata: Option<serde_json::Value>,
}

impl From<PublishedDeposition> for PublishResult {
    fn from(published: PublishedDeposition) -> Self {
        let record_id = published.id.and_then(|value| {
            RecordId::try_from(value)
                .inspect_err(|e| tracing::warn!("ignoring record id in publish response: {}", e))
                .ok()
        });
        let created = published.created.and_then(|value| match value {
            serde_json::Value::String(created) => Some(created),
            other => {
                tracing::warn!("ignoring non-string created timestamp: {}", other);
                None
            }
        });
        let metadata = published.metadata.and_then(|value| {
            serde_json::from_value::<RecordMetadata>(value)
                .inspect_err(|e| tracing::warn!("ignoring echoed metadata: {}", e))
                .ok()
        });

        Self {
            doi: published.doi,
            doi_url: published.links.doi,
            record_id,
            created,
            metadata,
        }
    }
}

/// Publishes records and their files, and obtains a DOI for them
pub struct DoiPublisher<T: DepositTransport = HttpTransport> {
    config: PublisherConfig,
    transport: T,
}

impl DoiPublisher<HttpTransport> {
    /// Create a publisher backed by the reqwest transport
    pub fn new(config: PublisherConfig) -> Result<Self, PublishError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a publisher from `ZENODO_TOKEN` in the process environment
    ///
    /// Fails with `ConfigurationError` before any client is built when the
    /// token is missing.
    pub fn from_env(sandbox: bool) -> Result<Self, PublishError> {
        Self::new(PublisherConfig::from_env(sandbox)?)
    }
}

impl<T: DepositTransport> DoiPublisher<T> {
    /// Create a publisher with a custom transport
    pub fn with_transport(config: PublisherConfig, transport: T) -> Self {
        tracing::info!(
            environment = %config.environment(),
            base_url = config.base_url(),
            token = %config.masked_token(),
            "using {} environment",
            config.environment()
        );
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn depositions_url(&self) -> String {
        format!("{}/api/deposit/depositions", self.config.base_url())
    }

    fn deposition_url(&self, record_id: &RecordId) -> String {
        format!("{}/{}", self.depositions_url(), record_id)
    }

    async fn call(
        &self,
        method: HttpMethod,
        url: String,
        body: RequestBody,
    ) -> Result<ApiResponse, PublishError> {
        self.transport
            .send(ApiRequest { method, url, body })
            .await?
            .error_for_status()
    }

    /// Create an empty draft, then attach `metadata` to it
    ///
    /// Issues exactly two calls. If the metadata update fails, the
    /// metadata-less draft stays on the remote service.
    pub async fn create_record(&self, metadata: &RecordMetadata) -> Result<RecordId, PublishError> {
        let response = self
            .call(HttpMethod::Post, self.depositions_url(), RequestBody::Json(json!({})))
            .await?;
        let created: CreatedDeposition = response.json()?;
        tracing::info!(record_id = %created.id, "created deposition {}", created.id);

        self.call(
            HttpMethod::Put,
            self.deposition_url(&created.id),
            RequestBody::Json(json!({ "metadata": metadata })),
        )
        .await?;
        tracing::debug!(record_id = %created.id, fields = metadata.len(), "metadata updated");

        Ok(created.id)
    }

    /// Upload one file to an existing draft
    ///
    /// The path is not checked beforehand; a missing or unreadable file
    /// surfaces as `PublishError::Io` and no request is sent.
    pub async fn attach_file(
        &self,
        record_id: &RecordId,
        file_path: &Path,
    ) -> Result<DepositFile, PublishError> {
        let contents = fs::read(file_path).await.map_err(|source| PublishError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string());

        let response = self
            .call(
                HttpMethod::Post,
                format!("{}/files", self.deposition_url(record_id)),
                RequestBody::File {
                    field: FILE_FIELD.to_string(),
                    file_name: file_name.clone(),
                    contents,
                },
            )
            .await?;
        let descriptor: DepositFile = response.json()?;
        tracing::info!(
            record_id = %record_id,
            checksum = descriptor.checksum.as_deref().unwrap_or("-"),
            "uploaded file: {}",
            file_name
        );

        Ok(descriptor)
    }

    /// Publish the draft and return the DOI bound to it
    ///
    /// Publishing is one-way: the record cannot be unpublished through this API.
    pub async fn publish(&self, record_id: &RecordId) -> Result<PublishResult, PublishError> {
        let response = self
            .call(
                HttpMethod::Post,
                format!("{}/actions/publish", self.deposition_url(record_id)),
                RequestBody::Empty,
            )
            .await?;
        let result: PublishResult = response.json::<PublishedDeposition>()?.into();

        tracing::info!(
            record_id = %record_id,
            doi = result.doi.as_deref().unwrap_or("-"),
            doi_url = result.doi_url.as_deref().unwrap_or("-"),
            "published"
        );

        Ok(result)
    }

    /// Create a record, upload every existing file, then publish
    ///
    /// Missing files are skipped with a warning. Any other failure stops the
    /// workflow at once and is returned as is; earlier steps are not undone.
    pub async fn upload_and_publish<P: AsRef<Path>>(
        &self,
        metadata: &RecordMetadata,
        file_paths: &[P],
    ) -> Result<PublishResult, PublishError> {
        tracing::info!(files = file_paths.len(), "starting DOI request");

        let record_id = self.create_record(metadata).await?;

        for file_path in file_paths {
            let file_path = file_path.as_ref();
            if fs::metadata(file_path).await.is_ok() {
                self.attach_file(&record_id, file_path).await?;
            } else {
                tracing::warn!("file does not exist, skipping: {}", file_path.display());
            }
        }

        self.publish(&record_id).await
    }
}
