//! Scripted video backend: a fixed sequence of status reads and a canned
//! content body.

use ai_video_concepts::{ApiError, ContentStream, CreateVideoRequest, VideoBackend, VideoJob};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const JOB_ID: &str = "video_test_123";

#[derive(Debug, Clone)]
pub enum StatusStep {
    /// A successful read with the given status and progress.
    Job(&'static str, f64),
    /// An HTTP error on the status read.
    Http(u16),
}

pub struct MockVideoBackend {
    steps: Mutex<VecDeque<StatusStep>>,
    chunks: Vec<Vec<u8>>,
    fail_download_after: Option<usize>,
    create_error: Option<u16>,
    content_error: Option<u16>,
    submitted: Mutex<Vec<CreateVideoRequest>>,
    creates: AtomicUsize,
    polls: AtomicUsize,
    downloads: AtomicUsize,
}

impl MockVideoBackend {
    pub fn new(steps: Vec<StatusStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            chunks: vec![vec![0u8; 10_000], vec![1u8; 2_500]],
            fail_download_after: None,
            create_error: None,
            content_error: None,
            submitted: Mutex::new(Vec::new()),
            creates: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    /// Content stream errors after handing out `chunks` chunks.
    #[allow(dead_code)]
    pub fn failing_download_after(mut self, chunks: usize) -> Self {
        self.fail_download_after = Some(chunks);
        self
    }

    /// Job creation answers with this HTTP status.
    #[allow(dead_code)]
    pub fn rejecting_create(mut self, code: u16) -> Self {
        self.create_error = Some(code);
        self
    }

    /// Opening the content answers with this HTTP status.
    #[allow(dead_code)]
    pub fn rejecting_content(mut self, code: u16) -> Self {
        self.content_error = Some(code);
        self
    }

    pub fn content_len(&self) -> u64 {
        self.chunks.iter().map(|c| c.len() as u64).sum()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn submitted(&self) -> Vec<CreateVideoRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

fn job(status: &str, progress: f64) -> VideoJob {
    let mut payload = json!({"id": JOB_ID, "object": "video", "status": status, "progress": progress});
    if status == "failed" {
        payload["error"] = json!({"code": "moderation_blocked", "message": "Prompt was blocked"});
    }
    VideoJob::from_payload(payload).expect("valid job payload")
}

fn http_error(code: u16) -> ApiError {
    ApiError::Status {
        status: StatusCode::from_u16(code).expect("valid status code"),
        body: format!("HTTP {}", code),
    }
}

struct ChunkStream {
    chunks: VecDeque<Vec<u8>>,
    fail_after: Option<usize>,
    served: usize,
}

#[async_trait]
impl ContentStream for ChunkStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ApiError> {
        if self.fail_after == Some(self.served) {
            return Err(http_error(502));
        }
        self.served += 1;
        Ok(self.chunks.pop_front())
    }
}

#[async_trait]
impl VideoBackend for MockVideoBackend {
    async fn create_job(&self, request: &CreateVideoRequest) -> Result<VideoJob, ApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());
        if let Some(code) = self.create_error {
            return Err(http_error(code));
        }
        Ok(job("queued", 0.0))
    }

    async fn job_status(&self, job_id: &str) -> Result<VideoJob, ApiError> {
        assert_eq!(job_id, JOB_ID);
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock video backend polled past its script");
        match step {
            StatusStep::Job(status, progress) => Ok(job(status, progress)),
            StatusStep::Http(code) => Err(http_error(code)),
        }
    }

    async fn open_content(&self, job_id: &str) -> Result<Box<dyn ContentStream>, ApiError> {
        assert_eq!(job_id, JOB_ID);
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.content_error {
            return Err(http_error(code));
        }
        Ok(Box::new(ChunkStream {
            chunks: self.chunks.clone().into(),
            fail_after: self.fail_download_after,
            served: 0,
        }))
    }
}
