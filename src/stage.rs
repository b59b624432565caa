use crate::error::{ApiError, StageError};
use crate::{logi, logw, snippet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: Self) -> Self::Output {
        TokenUsage {
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
        }
    }
}

/// One system + user exchange, constrained to a JSON object reply.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub reasoning_effort: &'a str,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct TextCompletion {
    pub content: String,
    pub usage: TokenUsage,
}

/// A remote text-generation service.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<TextCompletion, ApiError>;
}

#[derive(Debug, Clone)]
pub struct StageOutput {
    pub document: serde_json::Value,
    pub usage: TokenUsage,
    pub model: String,
}

/// Sends a fixed system instruction plus a templated user message to the
/// text backend and parses the reply as a single JSON object.
#[derive(Clone)]
pub struct StageInvoker {
    backend: Arc<dyn TextBackend>,
    model: String,
    reasoning_effort: String,
    verbose: bool,
}

impl StageInvoker {
    pub fn new(
        backend: Arc<dyn TextBackend>,
        model: impl Into<String>,
        reasoning_effort: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            reasoning_effort: reasoning_effort.into(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn reasoning_effort(&self) -> &str {
        &self.reasoning_effort
    }

    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<StageOutput, StageError> {
        if system_prompt.trim().is_empty() || user_prompt.trim().is_empty() {
            return Err(StageError::EmptyPrompt);
        }

        let request = CompletionRequest {
            model: &self.model,
            reasoning_effort: &self.reasoning_effort,
            system_prompt,
            user_prompt,
        };
        debug!(user_prompt_len = user_prompt.len(), "invoking text backend");

        let completion = self.backend.complete(&request).await?;
        let document = parse_json_object(&completion.content)?;

        if self.verbose {
            let pretty = serde_json::to_string_pretty(&document).unwrap_or_default();
            logi(format!("Generated document:\n{}", pretty));
            logi(format!(
                "Tokens Used: {} (prompt: {}, completion: {})",
                completion.usage.total_tokens,
                completion.usage.prompt_tokens,
                completion.usage.completion_tokens
            ));
        }

        Ok(StageOutput {
            document,
            usage: completion.usage,
            model: self.model.clone(),
        })
    }
}

/// Parses a model reply that must hold exactly one JSON object.
pub fn parse_json_object(reply: &str) -> Result<serde_json::Value, StageError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(StageError::EmptyReply);
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(StageError::InvalidJson {
            reason: "expected a JSON object".to_string(),
            raw: trimmed.to_string(),
        }),
        Err(err) => {
            logw(format!("Model reply is not JSON: {}", snippet(trimmed, 800)));
            Err(StageError::InvalidJson {
                reason: err.to_string(),
                raw: trimmed.to_string(),
            })
        }
    }
}
