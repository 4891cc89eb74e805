//! Uploading generic file attachments.
//!
//! The composer never talks to the network directly: it is handed an [`AttachmentUploader`],
//! and the default [`HttpAttachmentUploader`] posts the file as multipart form data to the
//! server's `/upload` endpoint.

use std::path::Path;

use async_trait::async_trait;
use composer_protocol::UploadMetadata;
use reqwest::StatusCode;
use url::Url;

/// Multipart form field carrying the file.
const UPLOAD_FIELD: &str = "file";
const UPLOAD_PATH: &str = "/upload";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to read attachment: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload failed with status {status}")]
    Status { status: StatusCode, body: String },
    #[error("upload response is not valid JSON: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<UploadMetadata, UploadError>;
}

#[derive(Debug, Clone)]
pub struct HttpAttachmentUploader {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpAttachmentUploader {
    /// Build an uploader that posts to `<server_url>/upload`.
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(server_url)?.join(UPLOAD_PATH)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AttachmentUploader for HttpAttachmentUploader {
    async fn upload(&self, path: &Path) -> Result<UploadMetadata, UploadError> {
        let file_bytes = tokio::fs::read(path).await?;
        let file_name = attachment_display_name(path);
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(&mime_type)?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// The name shown next to the composer for an attached file.
pub fn attachment_display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
