use crate::error::StageError;
use crate::prompts::{self, CREATIVE_DIRECTOR_SYSTEM_PROMPT, CREATIVE_DIRECTOR_USER_TEMPLATE};
use crate::stage::{StageInvoker, TokenUsage};
use crate::{logi, logw};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const REQUIRED_FIELDS: &[&str] = &[
    "core_concept",
    "creative_goal",
    "tone",
    "mood",
    "pacing_strategy",
    "visual_metaphor",
    "camera_approach",
    "aesthetic_style",
    "key_moments",
    "moodboard_keywords",
    "reference_styles",
];

/// The creative stage's output. Kept as the raw JSON object so it can be
/// handed to the scriptwriter unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreativeSpecification(Map<String, Value>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    #[serde(default)]
    pub moment: u32,
    #[serde(default)]
    pub timing: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub why: String,
}

impl CreativeSpecification {
    pub fn from_document(document: Value) -> Result<Self, StageError> {
        match document {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StageError::InvalidJson {
                reason: "creative specification must be a JSON object".to_string(),
                raw: other.to_string(),
            }),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn core_concept(&self) -> Option<&str> {
        self.text("core_concept")
    }

    pub fn tone(&self) -> Option<&str> {
        self.text("tone")
    }

    pub fn visual_metaphor(&self) -> Option<&str> {
        self.text("visual_metaphor")
    }

    /// Moments that parse cleanly; malformed entries are skipped.
    pub fn key_moments(&self) -> Vec<KeyMoment> {
        self.0
            .get("key_moments")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn moodboard_keywords(&self) -> Vec<String> {
        string_list(self.0.get("moodboard_keywords"))
    }

    pub fn reference_styles(&self) -> Vec<String> {
        string_list(self.0.get("reference_styles"))
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !self.0.contains_key(*field))
            .collect()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct CreativeDirection {
    pub specification: CreativeSpecification,
    pub usage: TokenUsage,
    pub model: String,
    pub timestamp: DateTime<Local>,
    pub input_one_liner: String,
}

/// First stage: one-liner in, creative specification out.
#[derive(Clone)]
pub struct CreativeDirector {
    invoker: StageInvoker,
}

impl CreativeDirector {
    pub fn new(invoker: StageInvoker) -> Self {
        Self { invoker }
    }

    pub fn model(&self) -> &str {
        self.invoker.model()
    }

    pub fn user_prompt(one_liner: &str) -> String {
        prompts::fill(CREATIVE_DIRECTOR_USER_TEMPLATE, &[("one_liner", one_liner)])
    }

    pub async fn run(&self, one_liner: &str) -> Result<CreativeDirection, StageError> {
        let verbose = self.invoker.is_verbose();
        if verbose {
            logi("=".repeat(80));
            logi("CREATIVE DIRECTOR AGENT - PROCESSING");
            logi(format!("Timestamp: {}", Local::now().format("%Y-%m-%d %H:%M:%S")));
            logi(format!("Model: {}", self.invoker.model()));
            logi(format!("Reasoning Effort: {}", self.invoker.reasoning_effort()));
            logi(format!("Target Duration: {} seconds", prompts::TARGET_SECONDS));
            logi(format!("Product One-Liner: {}", one_liner));
            logi("Analyzing product and generating creative vision...");
        }

        let user_prompt = Self::user_prompt(one_liner);
        let output = match self
            .invoker
            .invoke(CREATIVE_DIRECTOR_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if verbose {
                    logw(format!("ERROR in Creative Director Agent: {}", err));
                }
                return Err(err);
            }
        };

        let specification = CreativeSpecification::from_document(output.document)?;
        let missing = specification.missing_fields();
        if !missing.is_empty() {
            warn!(missing = ?missing, "creative specification is incomplete");
        }
        if verbose && !missing.is_empty() {
            logw(format!(
                "Creative specification is missing fields: {}",
                missing.join(", ")
            ));
        }

        Ok(CreativeDirection {
            specification,
            usage: output.usage,
            model: output.model,
            timestamp: Local::now(),
            input_one_liner: one_liner.to_string(),
        })
    }
}
