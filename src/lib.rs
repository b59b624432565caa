pub mod api;
pub mod concept;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod script;
pub mod stage;
pub mod video;

pub use concept::{CreativeDirector, CreativeSpecification, KeyMoment};
pub use config::{Config, PollPolicy};
pub use error::{ApiError, PipelineFailure, Stage, StageError, VideoError};
pub use pipeline::{PipelineResult, ProductOneLiner, VideoConceptPipeline};
pub use script::{ScriptDocument, Scriptwriter};
pub use stage::{CompletionRequest, StageInvoker, StageOutput, TextBackend, TextCompletion, TokenUsage};
pub use video::{
    ContentStream, CreateVideoRequest, DownloadedVideo, GenerationOutcome, JobStatus, VideoBackend,
    VideoDuration, VideoJob, VideoJobClient, VideoModel,
};

pub(crate) fn logv(tag: &str, message: &str) {
    eprintln!("[{}] {}", tag, message);
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}

pub(crate) fn logerr(message: impl AsRef<str>) {
    logv("ERROR", message.as_ref());
}

/// First `max_chars` characters of `text`, for log snippets.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
