use anyhow::Result;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct Config {
    pub openai_key: String,
    pub api_base: String,
    pub text_model: String,
    pub reasoning_effort: String,
    pub request_timeout: Duration,
}

fn default_text_model() -> String {
    "gpt-5.1".to_string()
}

fn default_reasoning_effort() -> String {
    "none".to_string()
}

impl Config {
    /// Reads `OPENAI_API_KEY` and the optional overrides from the process
    /// environment, loading a `.env` file first when one is present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_key = lookup("OPENAI_API_KEY")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if openai_key.is_empty() {
            anyhow::bail!("OPENAI_API_KEY not found in environment or .env file");
        }

        let api_base = lookup("OPENAI_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let text_model = lookup("CONCEPT_TEXT_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(default_text_model);
        let reasoning_effort = lookup("CONCEPT_REASONING_EFFORT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(default_reasoning_effort);

        Ok(Self {
            openai_key,
            api_base,
            text_model,
            reasoning_effort,
            request_timeout: Duration::from_secs(600),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("text_model", &self.text_model)
            .field("reasoning_effort", &self.reasoning_effort)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Timing for the video status poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub auth_retry_delay: Duration,
    /// Consecutive HTTP 403 responses tolerated before giving up.
    pub max_auth_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            auth_retry_delay: Duration::from_secs(10),
            max_auth_retries: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        assert!(Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn defaults_and_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.text_model, "gpt-5.1");
        assert_eq!(cfg.reasoning_effort, "none");

        let cfg = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("CONCEPT_TEXT_MODEL", "gpt-test"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_base, "http://localhost:8080/v1");
        assert_eq!(cfg.text_model, "gpt-test");
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn default_poll_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.auth_retry_delay, Duration::from_secs(10));
        assert_eq!(policy.max_auth_retries, 5);
    }
}
