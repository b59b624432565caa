use crate::config::Config;
use crate::error::ApiError;
use crate::stage::{CompletionRequest, TextBackend, TextCompletion, TokenUsage};
use crate::{logw, snippet};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat-completions text backend.
#[derive(Clone)]
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl OpenAiChat {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            api_key: cfg.openai_key.clone(),
            endpoint: format!("{}/chat/completions", cfg.api_base),
            timeout: cfg.request_timeout,
        }
    }
}

/// Logs the message, type and code of an OpenAI error body, returning the
/// message when there is one.
pub(crate) fn log_openai_error(resp_json: &str) -> Option<String> {
    let root: Value = serde_json::from_str(resp_json).ok()?;
    let err = root.get("error")?;

    let message = err.get("message").and_then(Value::as_str);
    if let Some(msg) = message {
        logw(format!("OpenAI error message: {}", msg));
    }
    if let Some(typ) = err.get("type").and_then(Value::as_str) {
        logw(format!("OpenAI error type: {}", typ));
    }
    if let Some(code) = err.get("code").and_then(Value::as_str) {
        logw(format!("OpenAI error code: {}", code));
    }
    message.map(str::to_string)
}

pub(crate) fn chat_request_body(request: &CompletionRequest<'_>) -> Value {
    json!({
        "model": request.model,
        "reasoning_effort": request.reasoning_effort,
        "messages": [
            {"role": "system", "content": request.system_prompt},
            {"role": "user", "content": request.user_prompt},
        ],
        "response_format": {"type": "json_object"},
    })
}

/// Pulls the first choice's message text and the usage counters out of a
/// chat-completions response body.
pub(crate) fn parse_chat_completion(resp_json: &str) -> Result<TextCompletion, ApiError> {
    let root: Value = serde_json::from_str(resp_json)
        .map_err(|err| ApiError::Malformed(format!("response is not JSON: {}", err)))?;

    let content = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Malformed("no message content in first choice".to_string()))?;

    let usage = root
        .get("usage")
        .map(|usage| {
            let count = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);
            TokenUsage {
                total_tokens: count("total_tokens"),
                prompt_tokens: count("prompt_tokens"),
                completion_tokens: count("completion_tokens"),
            }
        })
        .unwrap_or_default();

    Ok(TextCompletion {
        content: content.to_string(),
        usage,
    })
}

#[async_trait]
impl TextBackend for OpenAiChat {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<TextCompletion, ApiError> {
        let body = chat_request_body(request);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body_len = raw.len(), "chat completion response");

        if !status.is_success() {
            logw(format!("OpenAI HTTP {}", status.as_u16()));
            let message = log_openai_error(&raw);
            if message.is_none() && !raw.is_empty() {
                logw(format!("OpenAI raw body: {}", snippet(&raw, 800)));
            }
            return Err(ApiError::Status {
                status,
                body: message.unwrap_or(raw),
            });
        }

        parse_chat_completion(&raw).inspect_err(|_| {
            logw("OpenAI response parse failed.");
            if !raw.is_empty() {
                logw(format!("OpenAI raw body: {}", snippet(&raw, 800)));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_requests_json_object_with_both_messages() {
        let request = CompletionRequest {
            model: "gpt-5.1",
            reasoning_effort: "none",
            system_prompt: "sys",
            user_prompt: "usr",
        };
        let body = chat_request_body(&request);
        assert_eq!(body["model"], "gpt-5.1");
        assert_eq!(body["reasoning_effort"], "none");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "usr");
    }

    #[test]
    fn parses_content_and_usage() {
        let raw = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"tone\":\"bold\"}"}}],
            "usage": {"prompt_tokens": 300, "completion_tokens": 200, "total_tokens": 500}
        }"#;
        let completion = parse_chat_completion(raw).unwrap();
        assert_eq!(completion.content, "{\"tone\":\"bold\"}");
        assert_eq!(completion.usage.total_tokens, 500);
        assert_eq!(completion.usage.prompt_tokens, 300);
        assert_eq!(completion.usage.completion_tokens, 200);
    }

    #[test]
    fn missing_choices_is_malformed() {
        assert!(matches!(
            parse_chat_completion(r#"{"choices": []}"#),
            Err(ApiError::Malformed(_))
        ));
        assert!(matches!(
            parse_chat_completion("<html>"),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn error_message_is_extracted() {
        let raw = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        assert_eq!(log_openai_error(raw).as_deref(), Some("Invalid API key"));
        assert_eq!(log_openai_error("not json"), None);
    }
}
