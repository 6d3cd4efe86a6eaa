//! [`TemplateBackend`] over the backend's REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use stencil_shared::artifact::resolve_media_url;
use stencil_shared::constants::TEMPLATES_PATH;
use stencil_shared::{
    AddToLibraryRequest, ConversionJob, CreateJobRequest, JobId, LibraryItem, LibraryItemId,
    Target, Upload, UploadId,
};
use tracing::debug;

use crate::backend::{NewUpload, TemplateBackend};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

pub struct HttpBackend {
    client: Client,
    api_url: String,
    media_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            media_url: config.media_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{TEMPLATES_PATH}/{path}", self.api_url)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        error_for_status(resp).await
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let body = self.send(req).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Turn a non-success response into a [`ClientError`] carrying the backend's message.
async fn error_for_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
    });
    debug!(status = status.as_u16(), message = %message, "Backend rejected request");

    if status == StatusCode::NOT_FOUND {
        Err(ClientError::NotFound { message })
    } else {
        Err(ClientError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

/// Message from an error body: `message`, then `error`, then `errors`, then
/// the whole JSON document. `None` when the body is not JSON.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    for key in ["message", "error", "errors"] {
        match value.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Null) | Some(Value::String(_)) | None => {}
            Some(other) => return Some(other.to_string()),
        }
    }

    Some(value.to_string())
}

#[async_trait]
impl TemplateBackend for HttpBackend {
    async fn list_uploads(&self) -> Result<Vec<Upload>> {
        self.json(self.client.get(self.url("uploads/"))).await
    }

    async fn create_upload(&self, upload: NewUpload) -> Result<Upload> {
        let title = upload.title().to_string();
        let notes = upload.notes().to_string();
        let file_name = upload.file_name().to_string();
        let mime = upload.kind().mime();

        let part = reqwest::multipart::Part::bytes(upload.into_image())
            .file_name(file_name)
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new()
            .text("title", title)
            .text("notes", notes)
            .part("image", part);

        self.json(self.client.post(self.url("uploads/")).multipart(form))
            .await
    }

    async fn delete_upload(&self, id: UploadId) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("uploads/{id}/"))))
            .await?;
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<ConversionJob>> {
        self.json(self.client.get(self.url("jobs/"))).await
    }

    async fn create_job(&self, upload: UploadId, target: Target) -> Result<ConversionJob> {
        let body = CreateJobRequest { upload, target };
        self.json(self.client.post(self.url("jobs/")).json(&body))
            .await
    }

    async fn list_library(&self) -> Result<Vec<LibraryItem>> {
        self.json(self.client.get(self.url("library/"))).await
    }

    async fn add_to_library(&self, job: JobId, name: &str) -> Result<LibraryItem> {
        let body = AddToLibraryRequest {
            job_id: job,
            name: name.to_string(),
        };
        self.json(self.client.post(self.url("library/")).json(&body))
            .await
    }

    async fn delete_library_item(&self, id: LibraryItemId) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("library/{id}/"))))
            .await?;
        Ok(())
    }

    async fn fetch_artifact(&self, reference: &str) -> Result<Vec<u8>> {
        let url = resolve_media_url(&self.media_url, reference);
        let resp = self.send(self.client.get(url)).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}
