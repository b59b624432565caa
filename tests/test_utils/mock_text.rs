//! Scripted text backend that hands out replies in order.

use ai_video_concepts::{ApiError, CompletionRequest, TextBackend, TextCompletion, TokenUsage};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub enum MockReply {
    /// Reply content plus the total token count to report.
    Content(String, u64),
    /// HTTP error with the given status and body.
    Status(u16, String),
}

impl MockReply {
    pub fn json(value: &Value, tokens: u64) -> Self {
        MockReply::Content(value.to_string(), tokens)
    }
}

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

pub struct MockTextBackend {
    replies: Mutex<VecDeque<MockReply>>,
    seen: Mutex<Vec<SeenRequest>>,
    calls: AtomicUsize,
}

impl MockTextBackend {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextBackend for MockTextBackend {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<TextCompletion, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(SeenRequest {
            model: request.model.to_string(),
            system_prompt: request.system_prompt.to_string(),
            user_prompt: request.user_prompt.to_string(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock text backend ran out of replies");
        match reply {
            MockReply::Content(content, tokens) => Ok(TextCompletion {
                content,
                usage: TokenUsage {
                    total_tokens: tokens,
                    prompt_tokens: tokens / 2,
                    completion_tokens: tokens - tokens / 2,
                },
            }),
            MockReply::Status(code, body) => Err(ApiError::Status {
                status: StatusCode::from_u16(code).expect("valid status code"),
                body,
            }),
        }
    }
}
