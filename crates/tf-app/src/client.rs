use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::BackendError;
use crate::workflow;

/// Acknowledgement returned by the backend's `/prompt` endpoint after a
/// workflow has been queued.
#[derive(Debug, Clone, Deserialize)]
pub struct JobAck {
    /// Server-assigned identifier for the queued workflow.
    pub prompt_id: String,
    /// Position in the execution queue.
    #[serde(default)]
    pub number: i64,
}

/// The three outcomes of an artifact fetch the polling engine cares
/// about. Everything else surfaces as a [`BackendError`].
#[derive(Debug)]
pub enum ArtifactFetch {
    Ready(Vec<u8>),
    NotReady,
}

/// Kinds of backend-managed resources that can be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Checkpoints,
    Loras,
    UpscaleModels,
}

impl ResourceKind {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Checkpoints => "/models/checkpoints",
            Self::Loras => "/models/loras",
            Self::UpscaleModels => "/models/upscale_models",
        }
    }
}

/// Locates one job's artifact on the backend's output tree.
#[derive(Debug, Clone)]
pub struct ArtifactQuery {
    pub filename: String,
    pub subfolder: String,
}

impl ArtifactQuery {
    pub fn for_job(correlation_id: Uuid) -> Self {
        Self {
            filename: workflow::artifact_filename(correlation_id),
            subfolder: workflow::OUTPUT_SUBFOLDER.to_string(),
        }
    }
}

/// Stateless request/response wrapper around the backend HTTP API.
///
/// Exactly one network attempt per call; retry policy belongs to the
/// caller. Does not touch job records.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    /// Sent with every submission so the backend can address events back
    /// to this process.
    client_id: String,
    request_timeout: Duration,
    list_timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: String, request_timeout: Duration, list_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            client_id: Uuid::new_v4().to_string(),
            request_timeout,
            list_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queue a workflow for execution (`POST /prompt`).
    pub async fn submit_workflow(
        &self,
        graph: &serde_json::Value,
    ) -> Result<JobAck, BackendError> {
        let body = serde_json::json!({
            "prompt": graph,
            "client_id": self.client_id,
        });

        let response = self
            .http
            .post(format!("{}/prompt", self.base_url))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json::<JobAck>().await?)
    }

    /// Try to download a finished artifact (`GET /view`).
    ///
    /// A 404 is not an error here: it means the backend has not written
    /// the file yet and the caller should come back later.
    pub async fn fetch_artifact(
        &self,
        query: &ArtifactQuery,
    ) -> Result<ArtifactFetch, BackendError> {
        let response = self
            .http
            .get(format!("{}/view", self.base_url))
            .timeout(self.request_timeout)
            .query(&[
                ("filename", query.filename.as_str()),
                ("subfolder", query.subfolder.as_str()),
                ("type", "output"),
            ])
            .send()
            .await?;

        match response.status().as_u16() {
            200 => {
                let bytes = response.bytes().await?;
                Ok(ArtifactFetch::Ready(bytes.to_vec()))
            }
            404 => Ok(ArtifactFetch::NotReady),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(BackendError::Status { status, body })
            }
        }
    }

    /// List resource names of one kind (`GET /models/<kind>`).
    pub async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<String>, BackendError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, kind.path()))
            .timeout(self.list_timeout)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json::<Vec<String>>().await?)
    }

    /// Upload an input image to the backend (`POST /upload/image`),
    /// overwriting any previous upload with the same name.
    pub async fn upload_image(&self, name: &str, png_bytes: Vec<u8>) -> Result<(), BackendError> {
        let part = reqwest::multipart::Part::bytes(png_bytes)
            .file_name(name.to_string())
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("type", "input")
            .text("overwrite", "true");

        let response = self
            .http
            .post(format!("{}/upload/image", self.base_url))
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// Turn any non-2xx response into a [`BackendError::Status`] carrying
/// the body text for diagnostics.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
