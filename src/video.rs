use crate::config::PollPolicy;
use crate::error::{ApiError, VideoError};
use crate::output;
use crate::{logi, logok, logw, snippet};
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{info, warn};

pub const VIDEO_SIZE: &str = "1280x720";
pub const DOWNLOAD_CHUNK_BYTES: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote generation job as last reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoJob {
    pub id: String,
    pub status: JobStatus,
    pub progress: Option<f64>,
    /// The full status document from the last read.
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
struct JobFields {
    id: String,
    status: JobStatus,
    #[serde(default)]
    progress: Option<f64>,
}

impl VideoJob {
    pub fn from_payload(payload: Value) -> Result<Self, ApiError> {
        let fields: JobFields = serde_json::from_value(payload.clone())
            .map_err(|err| ApiError::Malformed(format!("video job: {}", err)))?;
        Ok(Self {
            id: fields.id,
            status: fields.status,
            progress: fields.progress,
            payload,
        })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.payload
            .get("error")
            .and_then(|err| err.get("message").or(Some(err)))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoModel {
    Sora2Pro,
    #[default]
    Sora2,
}

impl VideoModel {
    pub const ALL: [VideoModel; 2] = [VideoModel::Sora2Pro, VideoModel::Sora2];

    pub fn name(self) -> &'static str {
        match self {
            VideoModel::Sora2Pro => "sora-2-pro",
            VideoModel::Sora2 => "sora-2",
        }
    }

    pub fn cost_per_second(self) -> f64 {
        match self {
            VideoModel::Sora2Pro => 0.30,
            VideoModel::Sora2 => 0.10,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VideoModel::Sora2Pro => "Pro model - Higher quality (requires verified organization)",
            VideoModel::Sora2 => "Standard model - More stable and affordable",
        }
    }

    /// Menu key shown in the interactive selection.
    pub fn menu_key(self) -> &'static str {
        match self {
            VideoModel::Sora2Pro => "1",
            VideoModel::Sora2 => "2",
        }
    }

    /// Resolves a menu key or model name; anything else is `None`.
    pub fn from_choice(choice: &str) -> Option<Self> {
        let choice = choice.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.menu_key() == choice || m.name().eq_ignore_ascii_case(choice))
    }

    pub fn estimated_cost(self, duration: VideoDuration) -> f64 {
        f64::from(duration.seconds()) * self.cost_per_second()
    }
}

/// Clip lengths the video service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoDuration {
    Four,
    Eight,
    #[default]
    Twelve,
}

impl VideoDuration {
    pub fn seconds(self) -> u32 {
        match self {
            VideoDuration::Four => 4,
            VideoDuration::Eight => 8,
            VideoDuration::Twelve => 12,
        }
    }

    /// Largest supported length not above `seconds`, never below four.
    pub fn capped(seconds: u32) -> Self {
        match seconds {
            s if s >= 12 => VideoDuration::Twelve,
            s if s >= 8 => VideoDuration::Eight,
            _ => VideoDuration::Four,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateVideoRequest {
    pub model: String,
    pub prompt: String,
    /// Sent as a string; the service rejects numbers here.
    pub seconds: String,
    pub size: String,
}

impl CreateVideoRequest {
    pub fn new(prompt: &str, model: VideoModel, duration: VideoDuration) -> Self {
        Self {
            model: model.name().to_string(),
            prompt: prompt.to_string(),
            seconds: duration.seconds().to_string(),
            size: VIDEO_SIZE.to_string(),
        }
    }
}

/// Body of a finished video, read chunk by chunk.
#[async_trait]
pub trait ContentStream: Send {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ApiError>;
}

/// A remote video-generation job queue.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    async fn create_job(&self, request: &CreateVideoRequest) -> Result<VideoJob, ApiError>;

    async fn job_status(&self, job_id: &str) -> Result<VideoJob, ApiError>;

    async fn open_content(&self, job_id: &str) -> Result<Box<dyn ContentStream>, ApiError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedVideo {
    pub path: PathBuf,
    pub bytes: u64,
}

impl DownloadedVideo {
    pub fn size_mb(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Downloaded { job: VideoJob, video: DownloadedVideo },
    /// The job ended failed or canceled; nothing was downloaded.
    Unsuccessful(VideoJob),
}

/// Drains `stream` into `writer`, returning the byte count. Every failure,
/// including the final flush, comes back as an error so the caller can drop
/// the partial file.
async fn copy_stream<W>(
    job_id: &str,
    stream: &mut dyn ContentStream,
    mut writer: W,
    path: &Path,
) -> Result<u64, VideoError>
where
    W: AsyncWrite + Unpin,
{
    let io_err = |source| VideoError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut total: u64 = 0;

    while let Some(chunk) = stream
        .next_chunk()
        .await
        .map_err(|source| VideoError::Download {
            job_id: job_id.to_string(),
            source,
        })?
    {
        if chunk.is_empty() {
            continue;
        }
        writer.write_all(&chunk).await.map_err(io_err)?;
        total += chunk.len() as u64;
    }
    writer.flush().await.map_err(io_err)?;
    Ok(total)
}

pub fn progress_bar(progress: Option<f64>) -> String {
    let filled = (progress.unwrap_or(0.0).clamp(0.0, 100.0) / 10.0) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Submits prompts to the video service, polls jobs to a terminal status and
/// downloads the finished file.
#[derive(Clone)]
pub struct VideoJobClient {
    backend: Arc<dyn VideoBackend>,
    policy: PollPolicy,
    output_dir: PathBuf,
}

impl VideoJobClient {
    pub fn new(backend: Arc<dyn VideoBackend>, policy: PollPolicy) -> Self {
        Self {
            backend,
            policy,
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn submit(
        &self,
        prompt: &str,
        model: VideoModel,
        duration: VideoDuration,
    ) -> Result<VideoJob, VideoError> {
        if prompt.trim().is_empty() {
            return Err(VideoError::EmptyPrompt);
        }

        logi(format!("Model: {}", model.name()));
        logi(format!("Duration: {} seconds", duration.seconds()));
        logi(format!("Resolution: {}", VIDEO_SIZE));
        logi(format!("Estimated cost: ${:.2}", model.estimated_cost(duration)));
        if prompt.chars().count() > 200 {
            logi(format!("Prompt:\n{}...", snippet(prompt, 200)));
        } else {
            logi(format!("Prompt:\n{}", prompt));
        }
        logi("Submitting video generation job...");

        let request = CreateVideoRequest::new(prompt, model, duration);
        let job = self
            .backend
            .create_job(&request)
            .await
            .map_err(VideoError::Submission)?;

        info!(job_id = %job.id, status = %job.status, "video job created");
        logok("Job created successfully");
        logi(format!("  Job ID: {}", job.id));
        logi(format!("  Status: {}", job.status));
        Ok(job)
    }

    pub async fn poll_until_terminal(&self, job_id: &str) -> Result<VideoJob, VideoError> {
        logi("Generating video (this may take a few minutes)...");

        let started = Instant::now();
        let mut auth_failures: u32 = 0;
        let mut last_progress: Option<f64> = None;
        let mut first = true;

        loop {
            let job = match self.backend.job_status(job_id).await {
                Ok(job) => job,
                Err(err) if err.is_forbidden() => {
                    auth_failures += 1;
                    let body = match err {
                        ApiError::Status { body, .. } => body,
                        other => other.to_string(),
                    };
                    if auth_failures > self.policy.max_auth_retries {
                        return Err(VideoError::AuthRetriesExhausted {
                            job_id: job_id.to_string(),
                            attempts: auth_failures,
                            body,
                        });
                    }
                    warn!(job_id, attempt = auth_failures, "status check forbidden, retrying");
                    logw(format!(
                        "Authorization issue (403), retrying ({}/{})...",
                        auth_failures, self.policy.max_auth_retries
                    ));
                    tokio::time::sleep(self.policy.auth_retry_delay).await;
                    continue;
                }
                Err(source) => {
                    return Err(VideoError::StatusCheck {
                        job_id: job_id.to_string(),
                        source,
                    });
                }
            };
            auth_failures = 0;

            if first || job.progress != last_progress {
                logi(format!(
                    "  Status: {:12} | Progress: [{}] {:.0}% | Elapsed: {}s",
                    job.status.as_str().to_uppercase(),
                    progress_bar(job.progress),
                    job.progress.unwrap_or(0.0),
                    started.elapsed().as_secs()
                ));
                last_progress = job.progress;
                first = false;
            }

            if job.status.is_terminal() {
                info!(job_id, status = %job.status, "video job reached terminal status");
                return Ok(job);
            }

            tokio::time::sleep(self.policy.interval).await;
        }
    }

    /// Streams the finished video into `output_dir`.
    pub async fn download(&self, job_id: &str) -> Result<DownloadedVideo, VideoError> {
        logi("Downloading video...");
        let mut stream = self
            .backend
            .open_content(job_id)
            .await
            .map_err(|source| VideoError::Download {
                job_id: job_id.to_string(),
                source,
            })?;

        let path = self
            .output_dir
            .join(output::video_filename(job_id, Local::now()));
        let written = self.write_stream(job_id, stream.as_mut(), &path).await;
        let total = match written {
            Ok(total) => total,
            Err(err) => {
                if fs::remove_file(&path).await.is_ok() {
                    warn!(path = %path.display(), "removed partial download");
                }
                return Err(err);
            }
        };

        let video = DownloadedVideo { path, bytes: total };
        logok(format!(
            "Video downloaded: {} ({:.2} MB)",
            video.path.display(),
            video.size_mb()
        ));
        Ok(video)
    }

    async fn write_stream(
        &self,
        job_id: &str,
        stream: &mut dyn ContentStream,
        path: &Path,
    ) -> Result<u64, VideoError> {
        let file = fs::File::create(path).await.map_err(|source| VideoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_BYTES, file);
        copy_stream(job_id, stream, writer, path).await
    }

    /// Submit, poll to a terminal status, and download on completion.
    pub async fn generate(
        &self,
        prompt: &str,
        model: VideoModel,
        duration: VideoDuration,
    ) -> Result<GenerationOutcome, VideoError> {
        let job = self.submit(prompt, model, duration).await?;
        let job = self.poll_until_terminal(&job.id).await?;

        if job.status != JobStatus::Completed {
            logw(format!("Video generation ended with status: {}", job.status));
            if let Some(reason) = job.failure_reason() {
                logw(format!("Reason: {}", reason));
            }
            return Ok(GenerationOutcome::Unsuccessful(job));
        }

        let video = self.download(&job.id).await?;
        Ok(GenerationOutcome::Downloaded { job, video })
    }

    /// One status read; downloads only if the job has completed.
    pub async fn check(&self, job_id: &str) -> Result<(VideoJob, Option<DownloadedVideo>), VideoError> {
        let job = self
            .backend
            .job_status(job_id)
            .await
            .map_err(|source| VideoError::StatusCheck {
                job_id: job_id.to_string(),
                source,
            })?;
        logi(format!("Status: {}", job.status));
        logi(format!("Progress: {:.0}%", job.progress.unwrap_or(0.0)));

        if job.status == JobStatus::Completed {
            let video = self.download(job_id).await?;
            return Ok((job, Some(video)));
        }
        Ok((job, None))
    }
}
