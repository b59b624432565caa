use crate::api::openai::log_openai_error;
use crate::config::Config;
use crate::error::ApiError;
use crate::video::{ContentStream, CreateVideoRequest, VideoBackend, VideoJob};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the `/videos` job endpoints.
#[derive(Clone)]
pub struct OpenAiVideos {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiVideos {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            api_key: cfg.openai_key.clone(),
            base_url: format!("{}/videos", cfg.api_base),
        }
    }

    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}/{}", self.base_url, job_id)
    }

    pub fn content_url(&self, job_id: &str) -> String {
        format!("{}/{}/content", self.base_url, job_id)
    }
}

async fn error_for_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "video API error");
    let body = log_openai_error(&body).unwrap_or(body);
    Err(ApiError::Status { status, body })
}

async fn read_job(resp: Response) -> Result<VideoJob, ApiError> {
    let resp = error_for_status(resp).await?;
    let payload: Value = resp
        .json()
        .await
        .map_err(|err| ApiError::Malformed(format!("video job body: {}", err)))?;
    VideoJob::from_payload(payload)
}

struct ResponseStream(Response);

#[async_trait]
impl ContentStream for ResponseStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ApiError> {
        let chunk = self.0.chunk().await?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl VideoBackend for OpenAiVideos {
    async fn create_job(&self, request: &CreateVideoRequest) -> Result<VideoJob, ApiError> {
        debug!(model = %request.model, seconds = %request.seconds, "creating video job");
        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;
        read_job(resp).await
    }

    async fn job_status(&self, job_id: &str) -> Result<VideoJob, ApiError> {
        let resp = self
            .client
            .get(self.job_url(job_id))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(60))
            .send()
            .await?;
        read_job(resp).await
    }

    async fn open_content(&self, job_id: &str) -> Result<Box<dyn ContentStream>, ApiError> {
        let resp = self
            .client
            .get(self.content_url(job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let resp = error_for_status(resp).await?;
        Ok(Box::new(ResponseStream(resp)))
    }
}
