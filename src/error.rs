use crate::concept::CreativeSpecification;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

/// Failure of a single HTTP exchange with a remote service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Malformed(_) => None,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::FORBIDDEN)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("system and user prompts must be non-empty")]
    EmptyPrompt,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("model returned an empty reply")]
    EmptyReply,

    #[error("model reply is not valid JSON: {reason}")]
    InvalidJson { reason: String, raw: String },

    #[error("script document has no final_multimodal_prompt")]
    MissingFinalPrompt,
}

/// Which language-model stage a pipeline failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CreativeDirector,
    Scriptwriter,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::CreativeDirector => "creative_director",
            Stage::Scriptwriter => "scriptwriter",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::CreativeDirector => "Creative Director",
            Stage::Scriptwriter => "Scriptwriter",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{} stage failed: {source}", .stage.label())]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub source: StageError,
    /// Output of the creative stage when the failure happened after it.
    pub creative_specification: Option<CreativeSpecification>,
}

impl PipelineFailure {
    /// Diagnostic document for the failed run.
    pub fn report(&self) -> serde_json::Value {
        let mut details = json!({
            "status": "error",
            "error": self.source.to_string(),
        });
        if let StageError::InvalidJson { raw, .. } = &self.source {
            details["raw_reply"] = json!(raw);
        }
        if let Some(spec) = &self.creative_specification {
            details["creative_specification"] = json!(spec);
        }

        json!({
            "status": "error",
            "error": format!("{} Agent failed", self.stage.label()),
            "failed_stage": self.stage,
            "details": details,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("video prompt is empty")]
    EmptyPrompt,

    #[error("video generation request failed: {0}")]
    Submission(#[source] ApiError),

    #[error("failed to check status of video {job_id}: {source}")]
    StatusCheck {
        job_id: String,
        #[source]
        source: ApiError,
    },

    #[error(
        "failed to check status of video {job_id} after {attempts} authorization errors ({body}); \
         the video may still be processing, check it later with `generate-video check {job_id}`"
    )]
    AuthRetriesExhausted {
        job_id: String,
        attempts: u32,
        body: String,
    },

    #[error("failed to download video {job_id}: {source}")]
    Download {
        job_id: String,
        #[source]
        source: ApiError,
    },

    #[error("file error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
